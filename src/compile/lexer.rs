//! Lexer for query strings
//!
//! Tokenizes an infix query string and reorders it into postfix via a
//! shunting-yard walk, so the parser can fold it with a plain stack.
//! Operator precedence, highest first: prefix `NOT`, then `AND`, then `OR`;
//! `AND` and `OR` are left-associative.
//!
//! Atoms keep their raw text (escapes and surrounding quotes included)
//! until term analysis. Whitespace inside an atom is preserved, so
//! `twilight sparkle` is a single atom; balanced parentheses opened while
//! an atom is accumulating belong to the atom, so `pinkie pie (cosplayer)`
//! is one atom too.

use crate::error::{LexError, Result};

/// Boolean operator marker in the postfix stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    And,
    Or,
    Not,
}

/// An unanalyzed term with its attached modifiers
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Raw term text, escapes and quotes preserved
    pub text: String,
    /// `^N` boost, when one was recognized adjacent to the atom
    pub boost: Option<f64>,
    /// `~N` fuzz, when one was recognized adjacent to the atom
    pub fuzz: Option<f64>,
}

/// One element of the postfix token stream
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Atom(Atom),
    Op(BoolOp),
}

/// Tokenize a query string into postfix order
///
/// Empty or whitespace-only input yields an empty stream.
pub fn lex(input: &str) -> Result<Vec<Token>> {
    Lexer::new(input).run()
}

/// Operators parked on the shunting-yard stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StackOp {
    And,
    Or,
    LParen,
}

#[derive(Debug, Default)]
struct AtomBuilder {
    text: String,
    boost: Option<f64>,
    fuzz: Option<f64>,
    /// Balance of parentheses embedded in the atom text
    depth: usize,
}

struct Lexer {
    input: Vec<char>,
    position: usize,
    output: Vec<Token>,
    ops: Vec<StackOp>,
    /// Negations saved per open group, parallel to `LParen` entries
    group_negate: Vec<u32>,
    /// Negations waiting for the next atom or group
    pending_not: u32,
    atom: Option<AtomBuilder>,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            output: Vec::new(),
            ops: Vec::new(),
            group_negate: Vec::new(),
            pending_not: 0,
            atom: None,
        }
    }

    fn run(mut self) -> Result<Vec<Token>> {
        while self.position < self.input.len() {
            let ch = self.current();
            match ch {
                '"' => self.read_quoted(),
                '\\' => self.read_escape()?,
                '~' | '^' if self.in_plain_atom() => self.read_modifier(ch),
                '(' => self.read_lparen(),
                ')' => self.read_rparen()?,
                ',' => {
                    self.end_atom();
                    self.shunt_and();
                    self.advance(1);
                }
                '&' if self.peek_is(1, '&') => {
                    self.end_atom();
                    self.shunt_and();
                    self.advance(2);
                }
                '|' if self.peek_is(1, '|') => {
                    self.end_atom();
                    self.shunt_or();
                    self.advance(2);
                }
                _ if self.at_keyword("AND") => {
                    self.end_atom();
                    self.shunt_and();
                    self.advance(3);
                }
                _ if self.at_keyword("OR") => {
                    self.end_atom();
                    self.shunt_or();
                    self.advance(2);
                }
                _ if self.at_prefix_not() => {
                    self.pending_not += 1;
                    self.advance(3);
                }
                '!' | '-' if self.atom.is_none() => {
                    self.pending_not += 1;
                    self.advance(1);
                }
                _ if ch.is_whitespace() => {
                    // Preserved inside an atom, ignored between tokens.
                    if self.atom.is_some() {
                        self.push_char(ch);
                    }
                    self.advance(1);
                }
                _ => {
                    self.push_char(ch);
                    self.advance(1);
                }
            }
        }

        self.end_atom();
        self.flush_pending_not();
        while let Some(op) = self.ops.pop() {
            match op {
                StackOp::LParen => return Err(LexError::UnmatchedParen.into()),
                StackOp::And => self.output.push(Token::Op(BoolOp::And)),
                StackOp::Or => self.output.push(Token::Op(BoolOp::Or)),
            }
        }
        Ok(self.output)
    }

    /// Consume a quoted literal into the current atom, quotes kept
    ///
    /// The surrounding quotes stay in the atom text so the term analyzer
    /// can tell the atom was quoted. An unterminated quote is consumed
    /// literally.
    fn read_quoted(&mut self) {
        self.push_char('"');
        self.advance(1);
        while self.position < self.input.len() {
            let ch = self.current();
            if ch == '\\' && self.position + 1 < self.input.len() {
                self.push_char('\\');
                self.push_char(self.input[self.position + 1]);
                self.advance(2);
            } else if ch == '"' {
                self.push_char('"');
                self.advance(1);
                return;
            } else {
                self.push_char(ch);
                self.advance(1);
            }
        }
    }

    /// Consume `\x`, keeping the escape for the term analyzer
    fn read_escape(&mut self) -> Result<()> {
        if self.position + 1 >= self.input.len() {
            return Err(LexError::NoTokenMatch.into());
        }
        self.push_char('\\');
        self.push_char(self.input[self.position + 1]);
        self.advance(2);
        Ok(())
    }

    /// Consume a `~N` or `^N` modifier, or abandon it back into the atom
    ///
    /// The modifier only sticks when the number is followed by end of
    /// input, whitespace, an operator character, or another modifier.
    /// Otherwise the matched text is ordinary atom content (`foo^bar`,
    /// `foo^2bar`).
    fn read_modifier(&mut self, kind: char) {
        let start = self.position;
        let mut end = self.position + 1;

        if kind == '^' && matches!(self.input.get(end).copied(), Some('+') | Some('-')) {
            end += 1;
        }
        let digits_start = end;
        while matches!(self.input.get(end), Some(c) if c.is_ascii_digit()) {
            end += 1;
        }
        if end == digits_start {
            // No number follows: the character itself is literal.
            self.push_char(kind);
            self.advance(1);
            return;
        }
        if self.input.get(end) == Some(&'.') {
            let mut frac_end = end + 1;
            while matches!(self.input.get(frac_end), Some(c) if c.is_ascii_digit()) {
                frac_end += 1;
            }
            if frac_end > end + 1 {
                end = frac_end;
            }
        }

        let text: String = self.input[start..end].iter().collect();
        let at_boundary = match self.input.get(end) {
            None => true,
            Some(c) => c.is_whitespace() || matches!(*c, ',' | ')' | '&' | '|' | '~' | '^'),
        };

        match text[1..].parse::<f64>() {
            Ok(number) if at_boundary && number.is_finite() => {
                if let Some(atom) = self.atom.as_mut() {
                    if kind == '~' {
                        atom.fuzz = Some(number);
                    } else {
                        atom.boost = Some(number);
                    }
                }
            }
            _ => {
                for ch in text.chars() {
                    self.push_char(ch);
                }
            }
        }
        self.position = end;
    }

    fn read_lparen(&mut self) {
        match &mut self.atom {
            Some(atom) => {
                atom.depth += 1;
                atom.text.push('(');
            }
            None => {
                self.group_negate.push(self.pending_not);
                self.pending_not = 0;
                self.ops.push(StackOp::LParen);
            }
        }
        self.advance(1);
    }

    fn read_rparen(&mut self) -> Result<()> {
        if let Some(atom) = &mut self.atom {
            if atom.depth > 0 {
                atom.depth -= 1;
                atom.text.push(')');
                self.advance(1);
                return Ok(());
            }
        }

        self.end_atom();
        self.flush_pending_not();
        loop {
            match self.ops.pop() {
                Some(StackOp::LParen) => break,
                Some(StackOp::And) => self.output.push(Token::Op(BoolOp::And)),
                Some(StackOp::Or) => self.output.push(Token::Op(BoolOp::Or)),
                None => return Err(LexError::UnmatchedParen.into()),
            }
        }
        let negations = self.group_negate.pop().unwrap_or(0);
        for _ in 0..negations {
            self.output.push(Token::Op(BoolOp::Not));
        }
        self.advance(1);
        Ok(())
    }

    fn shunt_and(&mut self) {
        while matches!(self.ops.last(), Some(StackOp::And)) {
            self.ops.pop();
            self.output.push(Token::Op(BoolOp::And));
        }
        self.ops.push(StackOp::And);
    }

    fn shunt_or(&mut self) {
        loop {
            match self.ops.last() {
                Some(StackOp::And) => {
                    self.ops.pop();
                    self.output.push(Token::Op(BoolOp::And));
                }
                Some(StackOp::Or) => {
                    self.ops.pop();
                    self.output.push(Token::Op(BoolOp::Or));
                }
                _ => break,
            }
        }
        self.ops.push(StackOp::Or);
    }

    /// Push the accumulated atom, followed by its pending negations
    fn end_atom(&mut self) {
        if let Some(atom) = self.atom.take() {
            self.output.push(Token::Atom(Atom {
                text: atom.text.trim_end().to_string(),
                boost: atom.boost,
                fuzz: atom.fuzz,
            }));
            self.flush_pending_not();
        }
    }

    fn flush_pending_not(&mut self) {
        for _ in 0..self.pending_not {
            self.output.push(Token::Op(BoolOp::Not));
        }
        self.pending_not = 0;
    }

    fn push_char(&mut self, ch: char) {
        self.atom.get_or_insert_with(AtomBuilder::default).text.push(ch);
    }

    /// Word operators only start where an atom break is possible: at the
    /// very start of an atom, or after whitespace inside one
    fn at_word_start(&self) -> bool {
        match &self.atom {
            None => true,
            Some(atom) => atom.text.chars().last().is_some_and(|c| c.is_whitespace()),
        }
    }

    fn at_keyword(&self, word: &str) -> bool {
        if !self.at_word_start() || !self.matches_chars(word) {
            return false;
        }
        match self.input.get(self.position + word.len()) {
            None => true,
            Some(c) => c.is_whitespace() || *c == '(',
        }
    }

    /// `NOT ` / `NOT(` prefix form, recognized only outside an atom
    fn at_prefix_not(&self) -> bool {
        self.atom.is_none()
            && self.matches_chars("NOT")
            && matches!(self.input.get(self.position + 3), Some(c) if c.is_whitespace() || *c == '(')
    }

    fn matches_chars(&self, word: &str) -> bool {
        word.chars()
            .enumerate()
            .all(|(i, wc)| self.input.get(self.position + i) == Some(&wc))
    }

    fn current(&self) -> char {
        self.input[self.position]
    }

    fn peek_is(&self, offset: usize, ch: char) -> bool {
        self.input.get(self.position + offset) == Some(&ch)
    }

    fn in_plain_atom(&self) -> bool {
        self.atom.as_ref().is_some_and(|a| a.depth == 0)
    }

    fn advance(&mut self, by: usize) {
        self.position += by;
    }
}
