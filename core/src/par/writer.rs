//! Line-wrapping PAR emitter.
//!
//! Output is a sequence of statements. Each statement is a run of
//! space-separated tokens that is wrapped onto continuation lines when the
//! next token would not fit:
//!
//! | kind    | first line | continuation |
//! |---------|------------|--------------|
//! | command | (none)     | 4 spaces     |
//! | string  | `#`        | `#>> `       |
//! | comment | `*`        | `*`          |
//!
//! A token is never split; one that does not fit on a line of its own is an
//! error.

use std::fmt::Display;

use super::model::{Event, EventAttributes, EventDefaults, EventDef, Par};
use super::symbols::{Keyword, SymbolTable};
use crate::error::ParError;

/// Default column budget of a PAR line
pub const DEFAULT_LINE_WIDTH: usize = 130;

/// Dash rule written under each event header
const EVENT_RULE: &str = "--------------------------------------------------------";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Command,
    String,
    Comment,
}

impl StatementKind {
    fn first_marker(self) -> &'static str {
        match self {
            StatementKind::Command => "",
            StatementKind::String => "#",
            StatementKind::Comment => "*",
        }
    }

    fn continuation_marker(self) -> &'static str {
        match self {
            StatementKind::Command => "    ",
            StatementKind::String => "#>> ",
            StatementKind::Comment => "*",
        }
    }
}

/// Accumulates wrapped PAR text.
pub struct ParWriter<'a> {
    symbols: &'a dyn SymbolTable,
    line_width: usize,
    buf: String,
}

impl<'a> ParWriter<'a> {
    pub fn new(symbols: &'a dyn SymbolTable, line_width: usize) -> Self {
        Self {
            symbols,
            line_width,
            buf: String::new(),
        }
    }

    /// Textual name of a keyword in the writer's vocabulary
    pub fn name(&self, keyword: Keyword) -> &'a str {
        self.symbols.name(keyword)
    }

    /// Write a command statement headed by `keyword`.
    pub fn command<T: Display>(&mut self, keyword: Keyword, params: &[T]) -> Result<(), ParError> {
        let mut tokens = Vec::with_capacity(params.len() + 1);
        tokens.push(self.name(keyword).to_string());
        tokens.extend(params.iter().map(ToString::to_string));
        self.statement(StatementKind::Command, &tokens)
    }

    pub fn string<T: Display>(&mut self, tokens: &[T]) -> Result<(), ParError> {
        let tokens: Vec<String> = tokens.iter().map(ToString::to_string).collect();
        self.statement(StatementKind::String, &tokens)
    }

    pub fn comment(&mut self, text: &str) -> Result<(), ParError> {
        self.statement(StatementKind::Comment, &[text.to_string()])
    }

    /// A string statement headed by an attribute keyword
    fn attribute<T: Display>(&mut self, keyword: Keyword, values: &[T]) -> Result<(), ParError> {
        let mut tokens = Vec::with_capacity(values.len() + 1);
        tokens.push(self.name(keyword).to_string());
        tokens.extend(values.iter().map(ToString::to_string));
        self.statement(StatementKind::String, &tokens)
    }

    pub fn newline(&mut self) {
        self.buf.push('\n');
    }

    /// Emit one statement, wrapping between tokens.
    pub fn statement(&mut self, kind: StatementKind, tokens: &[String]) -> Result<(), ParError> {
        let width = self.line_width as isize;
        let mut marker = kind.first_marker();
        let mut remain = width - marker.len() as isize;
        let mut line = String::new();

        for token in tokens {
            let len = token.chars().count() as isize;

            if remain - 1 - len <= 0 {
                if line.is_empty() {
                    return Err(ParError::TooLong(token.clone()));
                }
                self.flush_line(marker, &line);
                line.clear();
                marker = kind.continuation_marker();
                remain = width - marker.len() as isize;

                if remain - 1 - len <= 0 {
                    return Err(ParError::TooLong(token.clone()));
                }
            }

            if !line.is_empty() {
                line.push(' ');
                remain -= 1;
            }
            line.push_str(token);
            remain -= len;
        }

        if !line.is_empty() {
            self.flush_line(marker, &line);
        }
        Ok(())
    }

    fn flush_line(&mut self, marker: &str, line: &str) {
        self.buf.push_str(marker);
        self.buf.push_str(line);
        self.buf.push('\n');
    }

    pub fn finish(self) -> String {
        self.buf
    }

    fn event_attributes(&mut self, attrs: &EventAttributes) -> Result<(), ParError> {
        let mut years = attrs.years.clone();
        years.extend(attrs.repeat_interval);
        if !years.is_empty() {
            self.attribute(Keyword::EventYears, &years)?;
        }
        if !attrs.branching.is_empty() {
            self.attribute(Keyword::Branching, &attrs.branching)?;
        }
        if !attrs.probability.is_empty() {
            self.attribute(Keyword::Probability, &attrs.probability)?;
        }
        if let Some(condition) = &attrs.condition {
            self.attribute(Keyword::Condition, &condition.to_floats())?;
        }
        if !attrs.min_intervals.is_empty() {
            self.attribute(Keyword::MinIntervals, &attrs.min_intervals)?;
        }
        if !attrs.comparable_events.is_empty() {
            let ids: Vec<i64> = attrs.comparable_events.iter().map(|r| r.id()).collect();
            self.attribute(Keyword::ComparableEvents, &ids)?;
        }
        if !attrs.feasible_predecessors.is_empty() {
            let ids: Vec<i64> = attrs.feasible_predecessors.iter().map(|r| r.id()).collect();
            self.attribute(Keyword::FeasiblePredecessors, &ids)?;
        }
        Ok(())
    }

    pub fn event(&mut self, event: &Event) -> Result<(), ParError> {
        self.command::<f64>(Keyword::Event, &[])?;
        self.string(&[format!("{} {}", event.id, event.name)])?;
        self.comment(EVENT_RULE)?;
        self.event_attributes(&event.attributes)?;
        for call in &event.calls {
            self.attribute(Keyword::RoutineCall, &call.to_floats())?;
        }
        Ok(())
    }

    pub fn event_defaults(&mut self, defaults: &EventDefaults) -> Result<(), ParError> {
        self.command::<f64>(Keyword::EventDefaults, &[])?;
        self.event_attributes(&defaults.attributes)
    }

    /// Emit a whole document: years, output, control, events, includes.
    pub fn par(&mut self, par: &Par) -> Result<(), ParError> {
        if let Some(years) = &par.years {
            self.command(Keyword::Years, years)?;
            self.newline();
        }
        if let Some(output) = &par.output {
            self.command(Keyword::Output, &output.to_floats()?)?;
            self.newline();
        }
        if let Some(control) = &par.control {
            self.command(Keyword::Control, &control.to_floats()?)?;
            self.newline();
        }
        for def in par.events() {
            match def {
                EventDef::Event(ev) => self.event(ev)?,
                EventDef::Defaults(d) => self.event_defaults(d)?,
            }
            self.newline();
        }
        for path in &par.includes {
            self.command(Keyword::Include, std::slice::from_ref(path))?;
        }
        Ok(())
    }
}

impl Par {
    /// Render as PAR text.
    pub fn to_par_string(
        &self,
        symbols: &dyn SymbolTable,
        line_width: usize,
    ) -> Result<String, ParError> {
        let mut out = ParWriter::new(symbols, line_width);
        out.par(self)?;
        Ok(out.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::par::condition::{Constraint, ConstraintValue, DnfCondition};
    use crate::par::model::{EventRef, RoutineCall};
    use crate::par::symbols::Vocabulary;
    use crate::var::Var;

    fn render(width: usize, f: impl FnOnce(&mut ParWriter<'_>) -> Result<(), ParError>) -> String {
        let vocab = Vocabulary::finnish();
        let mut out = ParWriter::new(&vocab, width);
        f(&mut out).unwrap();
        out.finish()
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_command_wraps_with_indent() {
        let out = render(10, |w| {
            w.statement(StatementKind::Command, &tokens(&["AB", "123456", "7"]))
        });
        assert_eq!(out, "AB 123456\n    7\n");
    }

    #[test]
    fn test_string_and_comment_markers() {
        let out = render(12, |w| {
            w.statement(StatementKind::String, &tokens(&["ABCD", "1234", "5678"]))?;
            w.statement(StatementKind::Comment, &tokens(&["xxxxxx", "yyyy"]))
        });
        assert_eq!(out, "#ABCD 1234\n#>> 5678\n*xxxxxx\n*yyyy\n");
    }

    #[test]
    fn test_token_too_long() {
        let vocab = Vocabulary::finnish();
        let mut out = ParWriter::new(&vocab, 8);
        let err = out
            .statement(StatementKind::Command, &tokens(&["ABCDEFGH"]))
            .unwrap_err();
        assert!(matches!(err, ParError::TooLong(t) if t == "ABCDEFGH"));

        // fits the first line but not a continuation line
        let mut out = ParWriter::new(&vocab, 8);
        let err = out
            .statement(StatementKind::Command, &tokens(&["A", "BCDEF"]))
            .unwrap_err();
        assert!(matches!(err, ParError::TooLong(_)));
    }

    #[test]
    fn test_event_rendering() {
        let mut ev = Event::new(12, "Thinning from below");
        ev.attributes.years = vec![5.0, 10.0];
        ev.attributes.repeat_interval = Some(5.0);
        ev.attributes.probability = vec![0.5];
        ev.attributes.condition = Some(DnfCondition::new(vec![vec![Constraint::new(
            Var::by_id(42),
            vec![ConstraintValue::Literal(3.0)],
        )]]));
        ev.attributes.comparable_events = vec![EventRef::Resolved(3), EventRef::Unresolved(7)];
        ev.calls.push(RoutineCall::new(40.0, vec![1.5]));

        let out = render(DEFAULT_LINE_WIDTH, |w| w.event(&ev));
        let expected = format!(
            "TAPAHTUMA\n#12 Thinning from below\n*{EVENT_RULE}\n\
             #TAPAHTUMAVUODET 5 10 5\n#TODENNAKOISYYS 0.5\n#METSIKKOEHDOT 2 42 3\n\
             #VASTAAVAT_TAPAHTUMAT 3 7\n#TAPAHTUMAKUTSU 40 1 1.5\n"
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_document_order() {
        let mut par = Par::new();
        par.includes.push("common.par".to_string());
        par.add_event(Event::new(1, "a")).unwrap();
        par.add_event(EventDefaults::default()).unwrap();
        par.years = Some(vec![0.0, 5.0]);

        let vocab = Vocabulary::finnish().with_alias("YEARS", Keyword::Years);
        let out = par.to_par_string(&vocab, DEFAULT_LINE_WIDTH).unwrap();
        assert_eq!(
            out,
            format!(
                "YEARS 0 5\n\nTAPAHTUMA\n#1 a\n*{EVENT_RULE}\n\nTAPAHTUMA_OLETUSARVOT\n\nLUE common.par\n"
            )
        );
    }
}
