use crate::ast::*;
use crate::column::Column;
use crate::data_type::DataType;
use crate::error::{DbError, DbResult};
use crate::tokenizer::Token;
use crate::value::Value;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    pub fn parse(&mut self) -> DbResult<Statement> {
        let statement = match self.current_token() {
            Token::Create => self.parse_create(),
            Token::Drop => self.parse_drop_table(),
            Token::Insert => self.parse_insert(),
            Token::Select => self.parse_select(),
            Token::Update => self.parse_update(),
            Token::Delete => self.parse_delete(),
            other => Err(DbError::Syntax(format!("unexpected token: {other:?}"))),
        }?;

        // semicolon is optional in SQL so skip it
        if matches!(self.current_token(), Token::Semicolon) {
            self.advance();
        }

        // Check we are at the end of the statement
        if !self.is_at_end() {
            return Err(DbError::Syntax(format!(
                "unexpected token after statement: {:?}",
                self.current_token()
            )));
        }

        Ok(statement)
    }

    // helpers
    fn current_token(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current_token(), Token::Eof)
    }

    fn consume(&mut self, expected: Token) -> DbResult<()> {
        if *self.current_token() == expected {
            self.advance();
            Ok(())
        } else {
            Err(DbError::Syntax(format!(
                "expected {:?}, found {:?}",
                expected,
                self.current_token()
            )))
        }
    }

    fn consume_ident(&mut self) -> DbResult<String> {
        match self.current_token() {
            Token::Ident(string) => {
                let string = string.clone();
                self.advance();
                Ok(string)
            }
            _ => Err(DbError::Syntax(format!(
                "expected identifier, found {:?}",
                self.current_token()
            ))),
        }
    }

    fn consume_data_type(&mut self) -> DbResult<DataType> {
        let data_type = match self.current_token() {
            Token::Integer => DataType::Integer,
            Token::Text => DataType::Text,
            Token::Real => DataType::Real,
            Token::Boolean => DataType::Boolean,
            other => {
                return Err(DbError::Syntax(format!(
                    "token {other:?} is not a column type"
                )));
            }
        };
        self.advance();
        Ok(data_type)
    }

    /// Consumes a literal value: NULL, TRUE/FALSE, a number, or a string.
    fn consume_literal(&mut self) -> DbResult<Value> {
        let value = match self.current_token() {
            Token::Null => Value::Null,
            Token::True => Value::Boolean(true),
            Token::False => Value::Boolean(false),
            Token::Number(n) => Value::Integer(*n),
            Token::FloatNumber(f) => Value::Real(*f),
            Token::String(s) => Value::Text(s.clone()),
            other => {
                return Err(DbError::Syntax(format!(
                    "expected a literal value, found {other:?}"
                )));
            }
        };
        self.advance();
        Ok(value)
    }

    /// `<name> <TYPE> [PRIMARY KEY] [UNIQUE] [NOT NULL]`, constraint
    /// tokens accepted in any order after name and type.
    fn parse_column_def(&mut self) -> DbResult<Column> {
        let name = self.consume_ident()?;
        let data_type = self.consume_data_type()?;
        let mut column = Column::new(name, data_type);

        loop {
            match self.current_token() {
                Token::Primary => {
                    self.advance();
                    self.consume(Token::Key)?;
                    column.primary_key = true;
                }
                Token::Unique => {
                    self.advance();
                    column.unique = true;
                }
                Token::Not => {
                    self.advance();
                    self.consume(Token::Null)?;
                    column.nullable = false;
                }
                _ => break,
            }
        }

        Ok(column)
    }

    /// Dispatches `CREATE TABLE` / `CREATE INDEX`.
    fn parse_create(&mut self) -> DbResult<Statement> {
        self.consume(Token::Create)?;
        match self.current_token() {
            Token::Table => self.parse_create_table(),
            Token::Index => self.parse_create_index(),
            other => Err(DbError::Syntax(format!(
                "expected TABLE or INDEX after CREATE, found {other:?}"
            ))),
        }
    }

    fn parse_create_table(&mut self) -> DbResult<Statement> {
        self.consume(Token::Table)?;
        let name = self.consume_ident()?;
        self.consume(Token::LeftParen)?;
        let mut columns = vec![];
        loop {
            columns.push(self.parse_column_def()?);
            match self.current_token() {
                Token::RightParen => {
                    self.advance();
                    break;
                }
                Token::Comma => {
                    self.advance();
                    continue;
                }
                _ => return Err(DbError::Syntax("expected ',' or ')'".into())),
            }
        }
        Ok(Statement::CreateTable(CreateTable { name, columns }))
    }

    fn parse_create_index(&mut self) -> DbResult<Statement> {
        self.consume(Token::Index)?;
        self.consume(Token::On)?;
        let table = self.consume_ident()?;
        self.consume(Token::LeftParen)?;
        let column = self.consume_ident()?;
        self.consume(Token::RightParen)?;
        Ok(Statement::CreateIndex(CreateIndex { table, column }))
    }

    fn parse_drop_table(&mut self) -> DbResult<Statement> {
        self.consume(Token::Drop)?;
        self.consume(Token::Table)?;
        let name = self.consume_ident()?;
        Ok(Statement::DropTable(DropTable { name }))
    }

    fn parse_insert(&mut self) -> DbResult<Statement> {
        self.consume(Token::Insert)?;
        self.consume(Token::Into)?;
        let table = self.consume_ident()?;

        self.consume(Token::LeftParen)?;
        let mut columns = vec![self.consume_ident()?];
        while matches!(self.current_token(), Token::Comma) {
            self.advance();
            columns.push(self.consume_ident()?);
        }
        self.consume(Token::RightParen)?;

        self.consume(Token::Values)?;
        self.consume(Token::LeftParen)?;
        let mut values = vec![self.consume_literal()?];
        while matches!(self.current_token(), Token::Comma) {
            self.advance();
            values.push(self.consume_literal()?);
        }
        self.consume(Token::RightParen)?;

        if columns.len() != values.len() {
            return Err(DbError::ArityMismatch {
                expected: columns.len(),
                got: values.len(),
            });
        }

        Ok(Statement::Insert(Insert {
            table,
            columns,
            values,
        }))
    }

    /// `SELECT * FROM <table>` followed by WHERE and/or JOIN clauses,
    /// each optional, in either order, at most once.
    fn parse_select(&mut self) -> DbResult<Statement> {
        self.consume(Token::Select)?;
        self.consume(Token::Star)?;
        self.consume(Token::From)?;
        let table = self.consume_ident()?;

        let mut where_clause = None;
        let mut join = None;
        loop {
            match self.current_token() {
                Token::Where => {
                    if where_clause.is_some() {
                        return Err(DbError::Syntax("duplicate WHERE clause".into()));
                    }
                    self.advance();
                    where_clause = Some(self.parse_expr()?);
                }
                Token::Join => {
                    if join.is_some() {
                        return Err(DbError::Syntax("duplicate JOIN clause".into()));
                    }
                    self.advance();
                    join = Some(self.parse_join_clause()?);
                }
                _ => break,
            }
        }

        Ok(Statement::Select(Select {
            table,
            where_clause,
            join,
        }))
    }

    fn parse_join_clause(&mut self) -> DbResult<JoinClause> {
        let table = self.consume_ident()?;
        self.consume(Token::On)?;
        let left = self.parse_qualified_column()?;
        self.consume(Token::Equal)?;
        let right = self.parse_qualified_column()?;
        Ok(JoinClause { table, left, right })
    }

    fn parse_qualified_column(&mut self) -> DbResult<QualifiedColumn> {
        let table = self.consume_ident()?;
        self.consume(Token::Dot)?;
        let column = self.consume_ident()?;
        Ok(QualifiedColumn { table, column })
    }

    fn parse_update(&mut self) -> DbResult<Statement> {
        self.consume(Token::Update)?;
        let table = self.consume_ident()?;
        self.consume(Token::Set)?;

        let mut assignments = vec![self.parse_assignment()?];
        while matches!(self.current_token(), Token::Comma) {
            self.advance();
            assignments.push(self.parse_assignment()?);
        }

        let where_clause = self.parse_optional_where()?;

        Ok(Statement::Update(Update {
            table,
            assignments,
            where_clause,
        }))
    }

    fn parse_assignment(&mut self) -> DbResult<(String, Value)> {
        let column = self.consume_ident()?;
        self.consume(Token::Equal)?;
        let value = self.consume_literal()?;
        Ok((column, value))
    }

    fn parse_delete(&mut self) -> DbResult<Statement> {
        self.consume(Token::Delete)?;
        self.consume(Token::From)?;
        let table = self.consume_ident()?;
        let where_clause = self.parse_optional_where()?;
        Ok(Statement::Delete(Delete {
            table,
            where_clause,
        }))
    }

    fn parse_optional_where(&mut self) -> DbResult<Option<Expr>> {
        if matches!(self.current_token(), Token::Where) {
            self.advance();
            Ok(Some(self.parse_expr()?))
        } else {
            Ok(None)
        }
    }

    // --- WHERE expression grammar ---
    // or_expr := and_expr (OR and_expr)*
    // and_expr := comparison (AND comparison)*
    // comparison := <column> <op> <literal>

    fn parse_expr(&mut self) -> DbResult<Expr> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.current_token(), Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Or {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> DbResult<Expr> {
        let mut left = self.parse_comparison()?;
        while matches!(self.current_token(), Token::And) {
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::And {
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> DbResult<Expr> {
        let column = self.consume_ident()?;
        let op = match self.current_token() {
            Token::Equal => ComparisonOp::Eq,
            Token::NotEqual => ComparisonOp::NotEq,
            Token::Lower => ComparisonOp::Lt,
            Token::LowerEqual => ComparisonOp::LtEq,
            Token::Greater => ComparisonOp::Gt,
            Token::GreaterEqual => ComparisonOp::GtEq,
            other => {
                return Err(DbError::Syntax(format!(
                    "expected a comparison operator, found {other:?}"
                )));
            }
        };
        self.advance();
        let value = self.consume_literal()?;
        Ok(Expr::Comparison { column, op, value })
    }
}
