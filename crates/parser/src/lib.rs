//! Hand-rolled recursive-descent parser for the CLI command grammar. The
//! grammar is small and fixed (no joins, no nested expressions, one
//! predicate per statement) so a general-purpose SQL parser would bring in
//! far more than it buys; this crate walks a flat token stream directly
//! into `common`'s own statement types.

mod ast;
mod tokenizer;

pub use ast::Statement;

use common::{CompareOp, Condition, EngineError, EngineResult, FieldList, FieldSpec, TableSchema};
use tokenizer::{Token, tokenize};
use types::{DataType, Value};

/// Parse one line of CLI input into a `Statement`.
pub fn parse(input: &str) -> EngineResult<Statement> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let stmt = parser.parse_statement()?;
    parser.expect_end()?;
    Ok(stmt)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect_end(&self) -> EngineResult<()> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(EngineError::Parser(format!(
                "unexpected trailing input: {:?}",
                &self.tokens[self.pos..]
            )))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> EngineResult<()> {
        match self.advance() {
            Some(Token::Ident(s)) if s == word => Ok(()),
            other => Err(EngineError::Parser(format!("expected '{word}', found {other:?}"))),
        }
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Ident(s)) if s == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self) -> EngineResult<String> {
        match self.advance() {
            Some(Token::Ident(s)) => Ok(s),
            other => Err(EngineError::Parser(format!("expected an identifier, found {other:?}"))),
        }
    }

    fn expect_lparen(&mut self) -> EngineResult<()> {
        match self.advance() {
            Some(Token::LParen) => Ok(()),
            other => Err(EngineError::Parser(format!("expected '(', found {other:?}"))),
        }
    }

    fn expect_rparen(&mut self) -> EngineResult<()> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            other => Err(EngineError::Parser(format!("expected ')', found {other:?}"))),
        }
    }

    fn eat_comma(&mut self) -> bool {
        if matches!(self.peek(), Some(Token::Comma)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_statement(&mut self) -> EngineResult<Statement> {
        let keyword = match self.peek() {
            Some(Token::Ident(s)) => s.clone(),
            other => return Err(EngineError::Parser(format!("expected a command, found {other:?}"))),
        };
        match keyword.as_str() {
            "create" => self.parse_create_table(),
            "drop" => self.parse_drop_table(),
            "insert" => self.parse_insert(),
            "select" => self.parse_select(),
            "delete" => self.parse_delete(),
            "tables" => {
                self.advance();
                Ok(Statement::Tables)
            }
            "describe" => self.parse_describe(),
            "quit" | "exit" => {
                self.advance();
                Ok(Statement::Quit)
            }
            other => Err(EngineError::Parser(format!("unknown command '{other}'"))),
        }
    }

    fn parse_create_table(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("create")?;
        self.expect_keyword("table")?;
        let table = self.expect_ident()?;
        self.expect_lparen()?;

        let mut fields = Vec::new();
        loop {
            let name = self.expect_ident()?;
            let ty_name = self.expect_ident()?;
            let data_type = match ty_name.as_str() {
                "int" => DataType::Integer,
                "string" => DataType::String,
                other => return Err(EngineError::Parser(format!("unknown field type '{other}'"))),
            };
            fields.push(FieldSpec::new(name, data_type)?);
            if self.eat_comma() {
                continue;
            }
            break;
        }
        self.expect_rparen()?;

        let schema = TableSchema::new(fields)?;
        Ok(Statement::CreateTable { table, schema })
    }

    fn parse_drop_table(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("drop")?;
        self.expect_keyword("table")?;
        let table = self.expect_ident()?;
        Ok(Statement::DropTable { table })
    }

    fn parse_insert(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("insert")?;
        self.expect_keyword("into")?;
        let table = self.expect_ident()?;
        self.expect_lparen()?;

        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if self.eat_comma() {
                continue;
            }
            break;
        }
        self.expect_rparen()?;
        Ok(Statement::Insert { table, values })
    }

    fn parse_select(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("select")?;
        let distinct = self.eat_keyword("distinct");

        let projection = if matches!(self.peek(), Some(Token::Star)) {
            self.advance();
            FieldList::all()
        } else {
            let mut names = Vec::new();
            loop {
                names.push(self.expect_ident()?);
                if self.eat_comma() {
                    continue;
                }
                break;
            }
            FieldList::from(names)
        };

        self.expect_keyword("from")?;
        let table = self.expect_ident()?;
        let condition = if self.eat_keyword("where") {
            self.parse_condition()?
        } else {
            Condition::MatchAll
        };

        Ok(Statement::Select { table, distinct, projection, condition })
    }

    fn parse_delete(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("delete")?;
        self.expect_keyword("from")?;
        let table = self.expect_ident()?;
        let condition = if self.eat_keyword("where") {
            self.parse_condition()?
        } else {
            Condition::MatchAll
        };
        Ok(Statement::Delete { table, condition })
    }

    fn parse_describe(&mut self) -> EngineResult<Statement> {
        self.expect_keyword("describe")?;
        let table = self.expect_ident()?;
        Ok(Statement::Describe { table })
    }

    fn parse_condition(&mut self) -> EngineResult<Condition> {
        let field = self.expect_ident()?;
        let op = self.parse_compare_op()?;
        let literal = self.parse_literal()?;
        Ok(Condition::Compare { field, op, literal })
    }

    fn parse_compare_op(&mut self) -> EngineResult<CompareOp> {
        match self.advance() {
            Some(Token::Eq) => Ok(CompareOp::Eq),
            Some(Token::Ne) => Ok(CompareOp::Ne),
            Some(Token::Gt) => Ok(CompareOp::Gt),
            Some(Token::Ge) => Ok(CompareOp::Ge),
            Some(Token::Lt) => Ok(CompareOp::Lt),
            Some(Token::Le) => Ok(CompareOp::Le),
            other => Err(EngineError::Parser(format!(
                "expected a comparison operator, found {other:?}"
            ))),
        }
    }

    fn parse_literal(&mut self) -> EngineResult<Value> {
        match self.advance() {
            Some(Token::Int(v)) => Ok(Value::Int(v)),
            Some(Token::Str(s)) => Ok(Value::Text(s)),
            other => Err(EngineError::Parser(format!("expected a literal value, found {other:?}"))),
        }
    }
}
