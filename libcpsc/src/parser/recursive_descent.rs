// Copyright 2025-2026 Neil Henderson
//
//! The `recursive_descent` module implements the CompiScript parser.

use crate::compiler_driver::{Diagnostic, Driver, ErrorKind};
use crate::core::SourceLocation;
use crate::lexer::{Keyword, Token, TokenType};

use super::abstract_syntax_tree::*;
use super::token_stream::TokenStream;

/// The error result for parse functions.
///
/// The diagnostic has already been recorded on the driver by the time this is returned; the
/// caller's job is only to synchronize and continue.
pub struct ParseError;

type ParseResult<T> = Result<T, ParseError>;

/// The recursive-descent parser.
pub struct Parser {
    stream: TokenStream,
    next_node_id: u32,
}

impl Parser {
    /// Creates a new parser over the given tokens.
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { stream: TokenStream::new(tokens), next_node_id: 0 }
    }

    /// Parses the whole program, recovering at statement boundaries after a syntax error.
    pub fn parse_program(mut self, driver: &mut Driver) -> AstProgram {
        let mut items = Vec::new();

        while !self.stream.at_end() {
            match self.parse_block_item(driver) {
                Ok(item) => items.push(item),
                Err(ParseError) => self.synchronize(),
            }
        }

        AstProgram(items)
    }

    fn make_node_id(&mut self) -> NodeId {
        let id = NodeId(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    // ---------------- Declarations and statements ----------------

    fn parse_block_item(&mut self, driver: &mut Driver) -> ParseResult<AstBlockItem> {
        if self.stream.next_token_is_keyword(Keyword::Let) || self.stream.next_token_is_keyword(Keyword::Var) {
            self.stream.take_token();
            let decl = self.parse_variable_decl(driver, false)?;
            return Ok(AstBlockItem::Declaration(AstDeclaration::Variable(decl)));
        }

        if self.stream.next_token_is_keyword(Keyword::Const) {
            self.stream.take_token();
            let decl = self.parse_variable_decl(driver, true)?;
            return Ok(AstBlockItem::Declaration(AstDeclaration::Variable(decl)));
        }

        if self.stream.next_token_is_keyword(Keyword::Function) {
            let function = self.parse_function_decl(driver)?;
            return Ok(AstBlockItem::Declaration(AstDeclaration::Function(function)));
        }

        if self.stream.next_token_is_keyword(Keyword::Class) {
            let class = self.parse_class_decl(driver)?;
            return Ok(AstBlockItem::Declaration(AstDeclaration::Class(class)));
        }

        Ok(AstBlockItem::Statement(self.parse_statement(driver)?))
    }

    /// Parses a variable declaration. The `let`/`var`/`const` keyword has already been consumed.
    fn parse_variable_decl(&mut self, driver: &mut Driver, is_const: bool) -> ParseResult<AstVariableDecl> {
        let (name, loc) = self.expect_identifier(driver, "variable name")?;

        let declared_type = if self.stream.take_token_if_expected(&TokenType::Colon).is_some() {
            Some(self.parse_type(driver)?)
        } else {
            None
        };

        let initializer = if self.stream.take_token_if_expected(&TokenType::Assignment).is_some() {
            Some(self.parse_expression(driver)?)
        } else {
            None
        };

        if is_const && initializer.is_none() {
            self.syntax_error(driver, "A 'const' declaration requires an initializer", loc);
            return Err(ParseError);
        }

        self.expect(driver, &TokenType::Semicolon, "';' at end of declaration")?;

        Ok(AstVariableDecl { id: self.make_node_id(), name, declared_type, initializer, is_const, loc })
    }

    fn parse_function_decl(&mut self, driver: &mut Driver) -> ParseResult<AstFunction> {
        self.stream.take_token(); // 'function'

        let (name, loc) = self.expect_identifier(driver, "function name")?;

        self.expect(driver, &TokenType::OpenParen, "'(' after function name")?;

        let mut params = Vec::new();
        if !self.stream.next_token_has_type(&TokenType::CloseParen) {
            loop {
                let (param_name, param_loc) = self.expect_identifier(driver, "parameter name")?;
                self.expect(driver, &TokenType::Colon, "':' after parameter name")?;
                let type_name = self.parse_type(driver)?;
                params.push(AstParam { name: param_name, type_name, loc: param_loc });

                if self.stream.take_token_if_expected(&TokenType::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(driver, &TokenType::CloseParen, "')' after parameters")?;

        let return_type = if self.stream.take_token_if_expected(&TokenType::Colon).is_some() {
            Some(self.parse_type(driver)?)
        } else {
            None
        };

        let body = self.parse_braced_block(driver)?;

        Ok(AstFunction { id: self.make_node_id(), name, params, return_type, body, loc })
    }

    fn parse_class_decl(&mut self, driver: &mut Driver) -> ParseResult<AstClass> {
        self.stream.take_token(); // 'class'

        let (name, loc) = self.expect_identifier(driver, "class name")?;

        let superclass = if self.stream.take_token_if_expected(&TokenType::Colon).is_some() {
            Some(self.expect_identifier(driver, "superclass name")?)
        } else {
            None
        };

        self.expect(driver, &TokenType::OpenBrace, "'{' after class name")?;

        let mut members = Vec::new();
        while !self.stream.next_token_has_type(&TokenType::CloseBrace) && !self.stream.at_end() {
            if self.stream.next_token_is_keyword(Keyword::Var) || self.stream.next_token_is_keyword(Keyword::Let) {
                self.stream.take_token();
                members.push(AstClassMember::Field(self.parse_variable_decl(driver, false)?));
            } else if self.stream.next_token_is_keyword(Keyword::Const) {
                self.stream.take_token();
                members.push(AstClassMember::Field(self.parse_variable_decl(driver, true)?));
            } else if self.stream.next_token_is_keyword(Keyword::Function) {
                members.push(AstClassMember::Method(self.parse_function_decl(driver)?));
            } else {
                let bad_loc = self.stream.next_location();
                self.syntax_error(driver, "Expected a field or method declaration in class body", bad_loc);
                return Err(ParseError);
            }
        }

        self.expect(driver, &TokenType::CloseBrace, "'}' at end of class body")?;

        Ok(AstClass { name, superclass, members, loc })
    }

    fn parse_statement(&mut self, driver: &mut Driver) -> ParseResult<AstStatement> {
        let Some(token) = self.stream.peek_next_token() else {
            let loc = self.stream.next_location();
            self.syntax_error(driver, "Expected a statement", loc);
            return Err(ParseError);
        };

        let loc = token.loc;

        match &token.token_type {
            TokenType::OpenBrace => Ok(AstStatement::Block(self.parse_braced_block(driver)?)),

            TokenType::Keyword(Keyword::If) => self.parse_if_statement(driver),
            TokenType::Keyword(Keyword::While) => self.parse_while_statement(driver),
            TokenType::Keyword(Keyword::Do) => self.parse_do_while_statement(driver),
            TokenType::Keyword(Keyword::For) => self.parse_for_statement(driver),
            TokenType::Keyword(Keyword::Foreach) => self.parse_foreach_statement(driver),

            TokenType::Keyword(Keyword::Break) => {
                self.stream.take_token();
                self.expect(driver, &TokenType::Semicolon, "';' after 'break'")?;
                Ok(AstStatement::Break { loc })
            }

            TokenType::Keyword(Keyword::Continue) => {
                self.stream.take_token();
                self.expect(driver, &TokenType::Semicolon, "';' after 'continue'")?;
                Ok(AstStatement::Continue { loc })
            }

            TokenType::Keyword(Keyword::Return) => {
                self.stream.take_token();
                let value = if self.stream.next_token_has_type(&TokenType::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression(driver)?)
                };
                self.expect(driver, &TokenType::Semicolon, "';' after return statement")?;
                Ok(AstStatement::Return { value, loc })
            }

            TokenType::Keyword(Keyword::Print) => {
                self.stream.take_token();
                self.expect(driver, &TokenType::OpenParen, "'(' after 'print'")?;
                let value = self.parse_expression(driver)?;
                self.expect(driver, &TokenType::CloseParen, "')' after print argument")?;
                self.expect(driver, &TokenType::Semicolon, "';' after print statement")?;
                Ok(AstStatement::Print { value, loc })
            }

            _ => {
                let expr = self.parse_expression(driver)?;
                self.expect(driver, &TokenType::Semicolon, "';' after expression")?;
                Ok(AstStatement::Expression(expr))
            }
        }
    }

    fn parse_braced_block(&mut self, driver: &mut Driver) -> ParseResult<AstBlock> {
        self.expect(driver, &TokenType::OpenBrace, "'{'")?;

        let mut items = Vec::new();
        while !self.stream.next_token_has_type(&TokenType::CloseBrace) && !self.stream.at_end() {
            match self.parse_block_item(driver) {
                Ok(item) => items.push(item),
                Err(ParseError) => self.synchronize_within_block(),
            }
        }

        self.expect(driver, &TokenType::CloseBrace, "'}' at end of block")?;

        Ok(AstBlock(items))
    }

    fn parse_if_statement(&mut self, driver: &mut Driver) -> ParseResult<AstStatement> {
        self.stream.take_token(); // 'if'

        self.expect(driver, &TokenType::OpenParen, "'(' after 'if'")?;
        let condition = self.parse_expression(driver)?;
        self.expect(driver, &TokenType::CloseParen, "')' after if condition")?;

        let then_block = self.parse_braced_block(driver)?;

        let else_block = if self.stream.take_token_if_expected(&TokenType::Keyword(Keyword::Else)).is_some() {
            if self.stream.next_token_is_keyword(Keyword::If) {
                // 'else if' chains become an else block holding the nested if.
                let nested = self.parse_if_statement(driver)?;
                Some(AstBlock(vec![AstBlockItem::Statement(nested)]))
            } else {
                Some(self.parse_braced_block(driver)?)
            }
        } else {
            None
        };

        Ok(AstStatement::If { condition, then_block, else_block })
    }

    fn parse_while_statement(&mut self, driver: &mut Driver) -> ParseResult<AstStatement> {
        self.stream.take_token(); // 'while'

        self.expect(driver, &TokenType::OpenParen, "'(' after 'while'")?;
        let condition = self.parse_expression(driver)?;
        self.expect(driver, &TokenType::CloseParen, "')' after while condition")?;

        let body = self.parse_braced_block(driver)?;

        Ok(AstStatement::While { condition, body })
    }

    fn parse_do_while_statement(&mut self, driver: &mut Driver) -> ParseResult<AstStatement> {
        self.stream.take_token(); // 'do'

        let body = self.parse_braced_block(driver)?;

        self.expect(driver, &TokenType::Keyword(Keyword::While), "'while' after do-while body")?;
        self.expect(driver, &TokenType::OpenParen, "'(' after 'while'")?;
        let condition = self.parse_expression(driver)?;
        self.expect(driver, &TokenType::CloseParen, "')' after do-while condition")?;
        self.expect(driver, &TokenType::Semicolon, "';' after do-while statement")?;

        Ok(AstStatement::DoWhile { body, condition })
    }

    fn parse_for_statement(&mut self, driver: &mut Driver) -> ParseResult<AstStatement> {
        self.stream.take_token(); // 'for'

        self.expect(driver, &TokenType::OpenParen, "'(' after 'for'")?;

        // Initializer: a variable declaration, an expression statement, or empty.
        let init = if self.stream.take_token_if_expected(&TokenType::Semicolon).is_some() {
            None
        } else if self.stream.next_token_is_keyword(Keyword::Let) || self.stream.next_token_is_keyword(Keyword::Var) {
            self.stream.take_token();
            let decl = self.parse_variable_decl(driver, false)?;
            Some(Box::new(AstBlockItem::Declaration(AstDeclaration::Variable(decl))))
        } else {
            let expr = self.parse_expression(driver)?;
            self.expect(driver, &TokenType::Semicolon, "';' after for initializer")?;
            Some(Box::new(AstBlockItem::Statement(AstStatement::Expression(expr))))
        };

        let condition = if self.stream.next_token_has_type(&TokenType::Semicolon) {
            None
        } else {
            Some(self.parse_expression(driver)?)
        };
        self.expect(driver, &TokenType::Semicolon, "';' after for condition")?;

        let update = if self.stream.next_token_has_type(&TokenType::CloseParen) {
            None
        } else {
            Some(self.parse_expression(driver)?)
        };
        self.expect(driver, &TokenType::CloseParen, "')' after for clauses")?;

        let body = self.parse_braced_block(driver)?;

        Ok(AstStatement::For { init, condition, update, body })
    }

    fn parse_foreach_statement(&mut self, driver: &mut Driver) -> ParseResult<AstStatement> {
        let loc = self.stream.next_location();
        self.stream.take_token(); // 'foreach'

        self.expect(driver, &TokenType::OpenParen, "'(' after 'foreach'")?;
        let (var_name, _) = self.expect_identifier(driver, "foreach variable")?;
        self.expect(driver, &TokenType::Keyword(Keyword::In), "'in' after foreach variable")?;
        let iterable = self.parse_expression(driver)?;
        self.expect(driver, &TokenType::CloseParen, "')' after foreach expression")?;

        let body = self.parse_braced_block(driver)?;

        Ok(AstStatement::Foreach { id: self.make_node_id(), var_name, iterable, body, loc })
    }

    // ---------------- Expressions ----------------

    pub fn parse_expression(&mut self, driver: &mut Driver) -> ParseResult<AstExpression> {
        self.parse_assignment(driver)
    }

    fn parse_assignment(&mut self, driver: &mut Driver) -> ParseResult<AstExpression> {
        let target = self.parse_ternary(driver)?;

        if self.stream.next_token_has_type(&TokenType::Assignment) {
            let loc = self.stream.next_location();
            self.stream.take_token();

            // Right-associative: `a = b = c` parses as `a = (b = c)`.
            let value = self.parse_assignment(driver)?;

            return Ok(AstExpression::Assignment {
                id: self.make_node_id(),
                target: Box::new(target),
                value: Box::new(value),
                loc,
            });
        }

        Ok(target)
    }

    fn parse_ternary(&mut self, driver: &mut Driver) -> ParseResult<AstExpression> {
        let condition = self.parse_binary(driver, 0)?;

        if self.stream.next_token_has_type(&TokenType::Ternary) {
            let loc = self.stream.next_location();
            self.stream.take_token();

            let then_expr = self.parse_expression(driver)?;
            self.expect(driver, &TokenType::Colon, "':' in ternary expression")?;
            let else_expr = self.parse_expression(driver)?;

            return Ok(AstExpression::Ternary {
                id: self.make_node_id(),
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                loc,
            });
        }

        Ok(condition)
    }

    /// Parses left-associative binary operators by precedence climbing.
    ///
    /// Levels, lowest to highest: `||`, `&&`, equality, relational, additive, multiplicative.
    fn parse_binary(&mut self, driver: &mut Driver, level: usize) -> ParseResult<AstExpression> {
        const LEVELS: &[&[(TokenType, AstBinaryOp)]] = &[
            &[(TokenType::LogicalOr, AstBinaryOp::LogicalOr)],
            &[(TokenType::LogicalAnd, AstBinaryOp::LogicalAnd)],
            &[(TokenType::EqualTo, AstBinaryOp::EqualTo), (TokenType::NotEqualTo, AstBinaryOp::NotEqualTo)],
            &[
                (TokenType::LessThan, AstBinaryOp::LessThan),
                (TokenType::LessThanOrEqualTo, AstBinaryOp::LessThanOrEqualTo),
                (TokenType::GreaterThan, AstBinaryOp::GreaterThan),
                (TokenType::GreaterThanOrEqualTo, AstBinaryOp::GreaterThanOrEqualTo),
            ],
            &[(TokenType::Plus, AstBinaryOp::Add), (TokenType::Minus, AstBinaryOp::Subtract)],
            &[
                (TokenType::Multiply, AstBinaryOp::Multiply),
                (TokenType::Divide, AstBinaryOp::Divide),
                (TokenType::Remainder, AstBinaryOp::Remainder),
            ],
        ];

        if level >= LEVELS.len() {
            return self.parse_unary(driver);
        }

        let mut lhs = self.parse_binary(driver, level + 1)?;

        'outer: loop {
            for (token_type, op) in LEVELS[level] {
                if self.stream.next_token_has_type(token_type) {
                    let loc = self.stream.next_location();
                    self.stream.take_token();

                    let rhs = self.parse_binary(driver, level + 1)?;

                    lhs = AstExpression::Binary {
                        id: self.make_node_id(),
                        op: *op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                        loc,
                    };
                    continue 'outer;
                }
            }
            break;
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self, driver: &mut Driver) -> ParseResult<AstExpression> {
        let loc = self.stream.next_location();

        let op = if self.stream.take_token_if_expected(&TokenType::Minus).is_some() {
            Some(AstUnaryOp::Negate)
        } else if self.stream.take_token_if_expected(&TokenType::LogicalNot).is_some() {
            Some(AstUnaryOp::LogicalNot)
        } else {
            None
        };

        if let Some(op) = op {
            let operand = self.parse_unary(driver)?;
            return Ok(AstExpression::Unary { id: self.make_node_id(), op, operand: Box::new(operand), loc });
        }

        self.parse_postfix(driver)
    }

    fn parse_postfix(&mut self, driver: &mut Driver) -> ParseResult<AstExpression> {
        let mut expr = self.parse_primary(driver)?;

        loop {
            if self.stream.next_token_has_type(&TokenType::OpenParen) {
                let loc = self.stream.next_location();
                self.stream.take_token();
                let args = self.parse_call_args(driver)?;
                expr = AstExpression::Call { id: self.make_node_id(), callee: Box::new(expr), args, loc };
            } else if self.stream.next_token_has_type(&TokenType::OpenSqBracket) {
                let loc = self.stream.next_location();
                self.stream.take_token();
                let index = self.parse_expression(driver)?;
                self.expect(driver, &TokenType::CloseSqBracket, "']' after array index")?;
                expr = AstExpression::Index {
                    id: self.make_node_id(),
                    array: Box::new(expr),
                    index: Box::new(index),
                    loc,
                };
            } else if self.stream.next_token_has_type(&TokenType::Dot) {
                let loc = self.stream.next_location();
                self.stream.take_token();
                let (member, _) = self.expect_identifier(driver, "member name after '.'")?;
                expr = AstExpression::Member { id: self.make_node_id(), object: Box::new(expr), member, loc };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parses the argument list of a call. The '(' has already been consumed.
    fn parse_call_args(&mut self, driver: &mut Driver) -> ParseResult<Vec<AstExpression>> {
        let mut args = Vec::new();

        if !self.stream.next_token_has_type(&TokenType::CloseParen) {
            loop {
                args.push(self.parse_expression(driver)?);
                if self.stream.take_token_if_expected(&TokenType::Comma).is_none() {
                    break;
                }
            }
        }

        self.expect(driver, &TokenType::CloseParen, "')' after arguments")?;

        Ok(args)
    }

    fn parse_primary(&mut self, driver: &mut Driver) -> ParseResult<AstExpression> {
        let Some(token) = self.stream.peek_next_token() else {
            let loc = self.stream.next_location();
            self.syntax_error(driver, "Expected an expression", loc);
            return Err(ParseError);
        };

        let loc = token.loc;
        let token_type = token.token_type.clone();

        match token_type {
            TokenType::IntegerLiteral { literal, value } => {
                self.stream.take_token();
                Ok(AstExpression::IntegerLiteral { id: self.make_node_id(), literal, value, loc })
            }

            TokenType::FloatLiteral { literal } => {
                self.stream.take_token();
                Ok(AstExpression::FloatLiteral { id: self.make_node_id(), literal, loc })
            }

            TokenType::StringLiteral { literal } => {
                self.stream.take_token();
                Ok(AstExpression::StringLiteral { id: self.make_node_id(), literal, loc })
            }

            TokenType::Keyword(Keyword::True) => {
                self.stream.take_token();
                Ok(AstExpression::BooleanLiteral { id: self.make_node_id(), value: true, loc })
            }

            TokenType::Keyword(Keyword::False) => {
                self.stream.take_token();
                Ok(AstExpression::BooleanLiteral { id: self.make_node_id(), value: false, loc })
            }

            TokenType::Keyword(Keyword::Null) => {
                self.stream.take_token();
                Ok(AstExpression::NullLiteral { id: self.make_node_id(), loc })
            }

            TokenType::Keyword(Keyword::This) => {
                self.stream.take_token();
                Ok(AstExpression::This { id: self.make_node_id(), loc })
            }

            TokenType::Keyword(Keyword::New) => {
                self.stream.take_token();
                let (class_name, _) = self.expect_identifier(driver, "class name after 'new'")?;
                self.expect(driver, &TokenType::OpenParen, "'(' after class name")?;
                let args = self.parse_call_args(driver)?;
                Ok(AstExpression::New { id: self.make_node_id(), class_name, args, loc })
            }

            TokenType::Identifier(name) => {
                self.stream.take_token();
                Ok(AstExpression::Identifier { id: self.make_node_id(), name, loc })
            }

            TokenType::OpenSqBracket => {
                self.stream.take_token();
                let mut elements = Vec::new();
                if !self.stream.next_token_has_type(&TokenType::CloseSqBracket) {
                    loop {
                        elements.push(self.parse_expression(driver)?);
                        if self.stream.take_token_if_expected(&TokenType::Comma).is_none() {
                            break;
                        }
                    }
                }
                self.expect(driver, &TokenType::CloseSqBracket, "']' at end of array literal")?;
                Ok(AstExpression::ArrayLiteral { id: self.make_node_id(), elements, loc })
            }

            TokenType::OpenParen => {
                self.stream.take_token();
                let expr = self.parse_expression(driver)?;
                self.expect(driver, &TokenType::CloseParen, "')' after expression")?;
                Ok(expr)
            }

            other => {
                self.syntax_error(driver, &format!("Unexpected token '{other}'"), loc);
                Err(ParseError)
            }
        }
    }

    // ---------------- Types ----------------

    fn parse_type(&mut self, driver: &mut Driver) -> ParseResult<AstTypeName> {
        let Some(token) = self.stream.take_token() else {
            let loc = self.stream.next_location();
            self.syntax_error(driver, "Expected a type", loc);
            return Err(ParseError);
        };

        let loc = token.loc;

        let mut type_name = match &token.token_type {
            TokenType::Keyword(Keyword::Integer) => AstTypeName::Integer,
            TokenType::Keyword(Keyword::Float) => AstTypeName::Float,
            TokenType::Keyword(Keyword::Boolean) => AstTypeName::Boolean,
            TokenType::Keyword(Keyword::Str) => AstTypeName::Str,
            TokenType::Keyword(Keyword::Void) => AstTypeName::Void,
            TokenType::Identifier(name) => AstTypeName::Class(name.clone()),
            other => {
                let message = format!("Expected a type, found '{other}'");
                self.syntax_error(driver, &message, loc);
                return Err(ParseError);
            }
        };

        // Each trailing '[]' wraps the type in another array level.
        while self.stream.next_token_has_type(&TokenType::OpenSqBracket) {
            self.stream.take_token();
            self.expect(driver, &TokenType::CloseSqBracket, "']' in array type")?;
            type_name = AstTypeName::Array(Box::new(type_name));
        }

        Ok(type_name)
    }

    // ---------------- Error handling ----------------

    fn expect(&mut self, driver: &mut Driver, token_type: &TokenType, what: &str) -> ParseResult<SourceLocation> {
        let loc = self.stream.next_location();

        if self.stream.take_token_if_expected(token_type).is_some() {
            Ok(loc)
        } else {
            self.syntax_error(driver, &format!("Expected {what}"), loc);
            Err(ParseError)
        }
    }

    fn expect_identifier(&mut self, driver: &mut Driver, what: &str) -> ParseResult<(String, SourceLocation)> {
        let loc = self.stream.next_location();

        match self.stream.peek_next_token() {
            Some(token) => {
                if let TokenType::Identifier(name) = &token.token_type {
                    let name = name.clone();
                    self.stream.take_token();
                    Ok((name, loc))
                } else {
                    self.syntax_error(driver, &format!("Expected {what}"), loc);
                    Err(ParseError)
                }
            }
            None => {
                self.syntax_error(driver, &format!("Expected {what}"), loc);
                Err(ParseError)
            }
        }
    }

    fn syntax_error(&self, driver: &mut Driver, message: &str, loc: SourceLocation) {
        driver.add_diagnostic(Diagnostic::error(ErrorKind::Syntax, message.to_string(), loc));
    }

    /// Skips tokens until just past the next ';', or to a token that can start a new item.
    fn synchronize(&mut self) {
        while let Some(token) = self.stream.peek_next_token() {
            match &token.token_type {
                TokenType::Semicolon => {
                    self.stream.take_token();
                    return;
                }
                TokenType::CloseBrace => {
                    self.stream.take_token();
                    return;
                }
                TokenType::Keyword(
                    Keyword::Let
                    | Keyword::Var
                    | Keyword::Const
                    | Keyword::Function
                    | Keyword::Class
                    | Keyword::If
                    | Keyword::While
                    | Keyword::For
                    | Keyword::Foreach
                    | Keyword::Return,
                ) => return,
                _ => {
                    self.stream.take_token();
                }
            }
        }
    }

    /// Like `synchronize`, but stops before a '}' so the enclosing block parse can close it.
    fn synchronize_within_block(&mut self) {
        while let Some(token) = self.stream.peek_next_token() {
            match &token.token_type {
                TokenType::Semicolon => {
                    self.stream.take_token();
                    return;
                }
                TokenType::CloseBrace => return,
                _ => {
                    self.stream.take_token();
                }
            }
        }
    }
}
