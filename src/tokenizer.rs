use crate::error::{DbError, DbResult};

/// Represents the smallest meaningful units (atoms) of the SQL subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // --- SQL Keywords ---
    Create,
    Table,
    Drop,
    Insert,
    Into,
    Values,
    Select,
    From,
    Where,
    And,
    Or,
    Update,
    Set,
    Delete,
    Join,
    On,
    Index,
    Not,
    Null,
    Primary,
    Key,
    Unique,

    // --- Data Types ---
    Integer,
    Text,
    Real,
    Boolean,

    // --- Identifiers & Literals ---
    /// A name representing a table or a column (e.g., `users`, `id`).
    Ident(String),
    /// A 64-bit integer literal (e.g., `42`).
    Number(i64),
    /// A string literal between single quotes (e.g., `'Alice'`). A doubled
    /// `''` inside the quotes escapes a single quote.
    String(String),
    /// A 64-bit floating-point literal (e.g., `3.14`).
    FloatNumber(f64),
    /// The boolean literal `TRUE`.
    True,
    /// The boolean literal `FALSE`.
    False,

    // --- Symbols ---
    /// Left parenthesis `(`
    LeftParen,
    /// Right parenthesis `)`
    RightParen,
    /// Comma `,`
    Comma,
    /// Semicolon `;`
    Semicolon,
    /// Dot `.` used in qualified column names (`table.column`)
    Dot,
    /// Wildcard symbol `*`
    Star,
    /// Equal to `=`
    Equal,
    /// Not equal to `!=`
    NotEqual,
    /// Greater than `>`
    Greater,
    /// Greater than or equal to `>=`
    GreaterEqual,
    /// Lower than `<`
    Lower,
    /// Lower than or equal to `<=`
    LowerEqual,

    // --- Special ---
    /// Represents the End Of File/Input.
    Eof,
}

/// A lexical scanner (lexer) that converts a raw SQL string into a sequence of [Token]s.
pub struct Tokenizer {
    /// The input string stored as a vector of characters for easy iteration.
    input: Vec<char>,
    /// The current position in the character vector.
    position: usize,
}

impl Tokenizer {
    /// Creates a new Tokenizer for the given input string.
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
        }
    }

    /// Processes the entire input and returns a vector of tokens.
    ///
    /// # Errors
    /// Returns a syntax error if an invalid character is encountered or if a
    /// literal (like a string) is malformed.
    ///
    /// # Example
    /// ```
    /// # use simpledb::tokenizer::{Tokenizer, Token};
    /// let mut t = Tokenizer::new("SELECT *");
    /// let tokens = t.tokenize().unwrap();
    /// assert_eq!(tokens[0], Token::Select);
    /// ```
    pub fn tokenize(&mut self) -> DbResult<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_at_end() {
            self.skip_whitespace();

            if self.is_at_end() {
                break;
            }

            let token = self.next_token()?;
            tokens.push(token);
        }

        tokens.push(Token::Eof);
        Ok(tokens)
    }

    /// Identifies the next token based on the character at the current position.
    fn next_token(&mut self) -> DbResult<Token> {
        let ch = self.current_char();

        match ch {
            '(' => {
                self.advance();
                Ok(Token::LeftParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RightParen)
            }
            ',' => {
                self.advance();
                Ok(Token::Comma)
            }
            ';' => {
                self.advance();
                Ok(Token::Semicolon)
            }
            '.' => {
                self.advance();
                Ok(Token::Dot)
            }
            '*' => {
                self.advance();
                Ok(Token::Star)
            }
            '=' => {
                self.advance();
                Ok(Token::Equal)
            }
            '!' => {
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::NotEqual)
                } else {
                    Err(DbError::Syntax("expected '=' after '!'".into()))
                }
            }
            '>' => {
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::GreaterEqual)
                } else {
                    Ok(Token::Greater)
                }
            }
            '<' => {
                self.advance();
                if !self.is_at_end() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::LowerEqual)
                } else {
                    Ok(Token::Lower)
                }
            }
            '-' => {
                self.advance();
                if !self.is_at_end() && self.current_char().is_numeric() {
                    match self.read_number()? {
                        Token::Number(n) => Ok(Token::Number(-n)),
                        Token::FloatNumber(f) => Ok(Token::FloatNumber(-f)),
                        _ => unreachable!("read_number returns numeric tokens"),
                    }
                } else {
                    Err(DbError::Syntax("expected a digit after '-'".into()))
                }
            }
            c if c.is_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_numeric() => self.read_number(),
            '\'' => self.read_string(),
            _ => Err(DbError::Syntax(format!(
                "character {ch:?} is not supported"
            ))),
        }
    }

    // --- Navigation Helpers ---

    /// Returns the character at the current position.
    fn current_char(&self) -> char {
        self.input[self.position]
    }

    /// Returns the character after the current position, if any.
    fn peek_char(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Moves the cursor forward by one character.
    fn advance(&mut self) {
        self.position += 1;
    }

    /// Checks if the cursor has reached the end of the input.
    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    /// Consumes any whitespace characters (spaces, tabs, newlines).
    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    // --- Extraction Logic ---

    /// Reads a sequence of alphanumeric characters and determines if it's
    /// a reserved SQL keyword or a user-defined identifier.
    ///
    /// Keywords are matched case-insensitively.
    fn read_identifier(&mut self) -> DbResult<Token> {
        let mut ident = String::new();

        while !self.is_at_end()
            && (self.current_char().is_alphanumeric() || self.current_char() == '_')
        {
            ident.push(self.current_char());
            self.advance();
        }

        match ident.to_uppercase().as_str() {
            "CREATE" => Ok(Token::Create),
            "TABLE" => Ok(Token::Table),
            "DROP" => Ok(Token::Drop),
            "INSERT" => Ok(Token::Insert),
            "INTO" => Ok(Token::Into),
            "VALUES" => Ok(Token::Values),
            "SELECT" => Ok(Token::Select),
            "FROM" => Ok(Token::From),
            "WHERE" => Ok(Token::Where),
            "AND" => Ok(Token::And),
            "OR" => Ok(Token::Or),
            "UPDATE" => Ok(Token::Update),
            "SET" => Ok(Token::Set),
            "DELETE" => Ok(Token::Delete),
            "JOIN" => Ok(Token::Join),
            "ON" => Ok(Token::On),
            "INDEX" => Ok(Token::Index),
            "NOT" => Ok(Token::Not),
            "NULL" => Ok(Token::Null),
            "PRIMARY" => Ok(Token::Primary),
            "KEY" => Ok(Token::Key),
            "UNIQUE" => Ok(Token::Unique),
            "INTEGER" => Ok(Token::Integer),
            "TEXT" => Ok(Token::Text),
            "REAL" => Ok(Token::Real),
            "BOOLEAN" => Ok(Token::Boolean),
            "TRUE" => Ok(Token::True),
            "FALSE" => Ok(Token::False),
            _ => Ok(Token::Ident(ident)),
        }
    }

    /// Reads a numeric literal. If a dot `.` is encountered, it returns a
    /// [Token::FloatNumber], otherwise a [Token::Number].
    fn read_number(&mut self) -> DbResult<Token> {
        let mut number = String::new();
        let mut has_dot = false;

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_numeric() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek_char().is_some_and(|c| c.is_numeric()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if has_dot {
            return number
                .parse::<f64>()
                .map(Token::FloatNumber)
                .map_err(|e| DbError::Syntax(e.to_string()));
        }

        number
            .parse::<i64>()
            .map(Token::Number)
            .map_err(|e| DbError::Syntax(e.to_string()))
    }

    /// Reads a string literal enclosed in single quotes. A doubled quote
    /// (`''`) inside the literal produces a single `'`.
    fn read_string(&mut self) -> DbResult<Token> {
        self.advance(); // Skip the opening quote

        let mut string = String::new();
        loop {
            if self.is_at_end() {
                return Err(DbError::Syntax("unterminated string".into()));
            }
            let ch = self.current_char();
            if ch == '\'' {
                if self.peek_char() == Some('\'') {
                    string.push('\'');
                    self.advance();
                    self.advance();
                    continue;
                }
                self.advance(); // Skip the closing quote
                break;
            }
            string.push(ch);
            self.advance();
        }

        Ok(Token::String(string))
    }
}
