use super::ast::*;
use crate::diagnostic::{Diagnostic, Diagnostics};
use crate::lexing::{Token, TokenKind};
use crate::source::Source;
use log::trace;

/// Raised on the first unrecoverable syntax violation. The positioned
/// diagnostic has already been reported; there is no resynchronization.
#[derive(Debug)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

type Result<T> = std::result::Result<T, ParseError>;

pub struct Parser<'a> {
    source: &'a Source,
    tokens: &'a [Token],
    index: usize,
    allow_struct_init: bool,
    diagnostics: &'a mut Diagnostics,
}

const ASSIGN_SYMBOLS: [&str; 5] = ["=", "+=", "-=", "*=", "/="];

impl<'a> Parser<'a> {
    pub fn new(source: &'a Source, tokens: &'a [Token], diagnostics: &'a mut Diagnostics) -> Self {
        Parser {
            source,
            tokens,
            index: 0,
            allow_struct_init: true,
            diagnostics,
        }
    }

    pub fn parse(mut self) -> Result<AstModule> {
        let mut items = Vec::new();
        while !self.is_at_end() {
            items.push(self.item()?);
        }
        trace!(target: "parser", "Parsed {} items from {}", items.len(), self.source.path.display());
        Ok(AstModule::new(items))
    }

    fn item(&mut self) -> Result<Item> {
        let kind = if self.match_keyword("fn") {
            ItemKind::Function(self.function_decl()?)
        } else if self.match_keyword("struct") {
            ItemKind::Struct(self.struct_decl()?)
        } else if self.match_keyword("enum") {
            ItemKind::Enum(self.enum_decl()?)
        } else if self.match_keyword("import") {
            let path = self.expect(TokenKind::Str, "Expected import path string")?.text.clone();
            self.expect_symbol(";")?;
            ItemKind::Import(path)
        } else if self.check_identifier("mod") {
            self.advance();
            let path = self.path()?;
            self.expect_symbol(";")?;
            ItemKind::ModDecl(path)
        } else if self.check_identifier("use") {
            self.advance();
            let path = self.path()?;
            let alias = if self.check_identifier("as") {
                self.advance();
                Some(self.expect(TokenKind::Identifier, "Expected alias name")?.text.clone())
            } else {
                None
            };
            self.expect_symbol(";")?;
            ItemKind::Use { path, alias }
        } else {
            return Err(self.error_here("Expected item (e.g., 'fn' or 'struct')"));
        };

        Ok(Item {
            kind,
            source: Source::clone(self.source),
        })
    }

    fn function_decl(&mut self) -> Result<FunctionDecl> {
        let name = self.expect(TokenKind::Identifier, "Expected function name")?.text.clone();
        self.expect_symbol("(")?;
        let mut params = Vec::new();
        if !self.check_symbol(")") {
            loop {
                let mutable = self.match_keyword("mut");
                let param_name = self
                    .expect(TokenKind::Identifier, "Expected parameter name")?
                    .text
                    .clone();
                self.expect_symbol(":")?;
                let type_name = self.type_name()?;
                params.push(Param {
                    name: param_name,
                    type_name,
                    mutable,
                });
                if !self.match_symbol(",") {
                    break;
                }
            }
        }
        self.expect_symbol(")")?;
        let return_type = if self.match_symbol("->") {
            Some(self.type_name()?)
        } else {
            None
        };
        let body = self.block()?;
        Ok(FunctionDecl {
            name,
            params,
            return_type,
            body,
        })
    }

    fn struct_decl(&mut self) -> Result<StructDecl> {
        let name = self.expect(TokenKind::Identifier, "Expected struct name")?.text.clone();
        self.expect_symbol("{")?;
        let mut fields = Vec::new();
        while !self.check_symbol("}") && !self.is_at_end() {
            let field_name = self.expect(TokenKind::Identifier, "Expected field name")?.text.clone();
            self.expect_symbol(":")?;
            let type_name = self.type_name()?;
            fields.push(FieldDecl {
                name: field_name,
                type_name,
            });
            if !self.match_symbol(",") {
                break;
            }
        }
        self.expect_symbol("}")?;
        Ok(StructDecl { name, fields })
    }

    fn enum_decl(&mut self) -> Result<EnumDecl> {
        let name = self.expect(TokenKind::Identifier, "Expected enum name")?.text.clone();
        self.expect_symbol("{")?;
        let mut variants = Vec::new();
        while !self.check_symbol("}") && !self.is_at_end() {
            let variant_name = self
                .expect(TokenKind::Identifier, "Expected variant name")?
                .text
                .clone();
            let payload = if self.match_symbol("(") {
                let payload = self.type_name()?;
                self.expect_symbol(")")?;
                Some(payload)
            } else {
                None
            };
            variants.push(VariantDecl {
                name: variant_name,
                payload,
            });
            if !self.match_symbol(",") {
                break;
            }
        }
        self.expect_symbol("}")?;
        Ok(EnumDecl { name, variants })
    }

    // Statements

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.expect_symbol("{")?;
        let mut body = Vec::new();
        while !self.check_symbol("}") && !self.is_at_end() {
            body.push(self.statement()?);
        }
        self.expect_symbol("}")?;
        Ok(body)
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.check_symbol("'") {
            let label = self.label()?;
            self.expect_symbol(":")?;
            return self.labeled_loop(label);
        }
        if self.match_keyword("if") {
            if self.match_keyword("let") {
                return self.if_let_stmt();
            }
            return self.if_stmt();
        }
        if self.match_keyword("for") {
            return self.for_stmt(None);
        }
        if self.match_keyword("loop") {
            return self.loop_stmt(None);
        }
        if self.match_keyword("while") {
            if self.match_keyword("let") {
                return self.while_let_stmt(None);
            }
            return self.while_stmt(None);
        }
        if self.match_keyword("break") {
            return self.break_stmt();
        }
        if self.match_keyword("continue") {
            return self.continue_stmt();
        }
        if self.match_keyword("return") {
            return self.return_stmt();
        }
        if self.match_keyword("let") {
            return self.let_stmt();
        }
        if self.check_assignment() {
            return self.assign_stmt();
        }
        let expr = self.expression()?;
        self.expect_symbol(";")?;
        Ok(Stmt::Expression(expr))
    }

    fn labeled_loop(&mut self, label: String) -> Result<Stmt> {
        if self.match_keyword("for") {
            return self.for_stmt(Some(label));
        }
        if self.match_keyword("while") {
            if self.match_keyword("let") {
                return self.while_let_stmt(Some(label));
            }
            return self.while_stmt(Some(label));
        }
        if self.match_keyword("loop") {
            return self.loop_stmt(Some(label));
        }
        Err(self.error_here("Labels can only be applied to loops"))
    }

    fn let_stmt(&mut self) -> Result<Stmt> {
        let mutable = self.match_keyword("mut");
        let name = self
            .expect(TokenKind::Identifier, "Expected identifier after 'let'")?
            .text
            .clone();
        let type_name = if self.match_symbol(":") {
            Some(self.type_name()?)
        } else {
            None
        };
        if !self.match_symbol("=") {
            return Err(self.error_here("Expected '=' after let binding"));
        }
        let value = self.expression()?;
        self.expect_symbol(";")?;
        Ok(Stmt::Let {
            name,
            mutable,
            type_name,
            value,
        })
    }

    fn assign_stmt(&mut self) -> Result<Stmt> {
        let name = self.expect(TokenKind::Identifier, "Expected identifier")?.text.clone();
        let symbol = self.advance().text.clone();
        let op = AssignOp::from_symbol(&symbol)
            .ok_or_else(|| self.error_here("Expected assignment operator"))?;
        let value = self.expression()?;
        self.expect_symbol(";")?;
        Ok(Stmt::Assign { name, op, value })
    }

    fn if_stmt(&mut self) -> Result<Stmt> {
        let condition = Box::new(self.guarded_expression()?);
        let then_branch = self.block()?;
        let else_branch = if self.match_keyword("else") {
            if self.match_keyword("if") {
                if self.match_keyword("let") {
                    Some(vec![self.if_let_stmt()?])
                } else {
                    Some(vec![self.if_stmt()?])
                }
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn if_let_stmt(&mut self) -> Result<Stmt> {
        let pattern = self.match_pattern()?;
        self.expect_symbol("=")?;
        let target = self.guarded_expression()?;
        let then_branch = self.block()?;
        let else_branch = if self.match_keyword("else") {
            if self.match_keyword("if") {
                if self.match_keyword("let") {
                    Some(vec![self.if_let_stmt()?])
                } else {
                    Some(vec![self.if_stmt()?])
                }
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Stmt::IfLet {
            pattern,
            target,
            then_branch,
            else_branch,
        })
    }

    fn while_stmt(&mut self, label: Option<String>) -> Result<Stmt> {
        let condition = self.guarded_expression()?;
        let body = self.block()?;
        Ok(Stmt::While {
            label,
            condition,
            body,
        })
    }

    fn while_let_stmt(&mut self, label: Option<String>) -> Result<Stmt> {
        let pattern = self.match_pattern()?;
        self.expect_symbol("=")?;
        let target = self.guarded_expression()?;
        let body = self.block()?;
        Ok(Stmt::WhileLet {
            label,
            pattern,
            target,
            body,
        })
    }

    fn for_stmt(&mut self, label: Option<String>) -> Result<Stmt> {
        let binding = self
            .expect(TokenKind::Identifier, "Expected loop variable name")?
            .text
            .clone();
        if !self.match_keyword("in") {
            return Err(self.error_here("Expected 'in' after loop variable"));
        }
        let start = self.guarded_expression()?;
        let inclusive = if self.match_symbol("..=") {
            true
        } else {
            self.expect_symbol("..")?;
            false
        };
        let end = self.guarded_expression()?;
        let body = self.block()?;
        Ok(Stmt::For {
            label,
            binding,
            start,
            end,
            inclusive,
            body,
        })
    }

    fn loop_stmt(&mut self, label: Option<String>) -> Result<Stmt> {
        let body = self.block()?;
        Ok(Stmt::Loop { label, body })
    }

    fn break_stmt(&mut self) -> Result<Stmt> {
        let label = if self.match_symbol("'") {
            Some(self.expect(TokenKind::Identifier, "Expected label after '''")?.text.clone())
        } else {
            None
        };
        let value = if self.check_symbol(";") {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_symbol(";")?;
        Ok(Stmt::Break { label, value })
    }

    fn continue_stmt(&mut self) -> Result<Stmt> {
        let label = if self.match_symbol("'") {
            Some(self.expect(TokenKind::Identifier, "Expected label after '''")?.text.clone())
        } else {
            None
        };
        self.expect_symbol(";")?;
        Ok(Stmt::Continue { label })
    }

    fn return_stmt(&mut self) -> Result<Stmt> {
        if self.match_symbol(";") {
            return Ok(Stmt::Return(None));
        }
        let expr = self.expression()?;
        self.expect_symbol(";")?;
        Ok(Stmt::Return(Some(expr)))
    }

    // Expressions, precedence climbing from loosest to tightest.

    fn expression(&mut self) -> Result<Expr> {
        self.or_expr()
    }

    /// Parses an expression with struct literals disabled, for positions where
    /// a following `{` belongs to the surrounding construct (conditions, match
    /// discriminees, `if let`/`while let` targets, `for` bounds).
    fn guarded_expression(&mut self) -> Result<Expr> {
        let previous = self.allow_struct_init;
        self.allow_struct_init = false;
        let result = self.expression();
        self.allow_struct_init = previous;
        result
    }

    fn or_expr(&mut self) -> Result<Expr> {
        let mut expr = self.and_expr()?;
        while self.match_symbol("||") {
            let right = self.and_expr()?;
            expr = binary(expr, BinaryOp::Or, right);
        }
        Ok(expr)
    }

    fn and_expr(&mut self) -> Result<Expr> {
        let mut expr = self.equality_expr()?;
        while self.match_symbol("&&") {
            let right = self.equality_expr()?;
            expr = binary(expr, BinaryOp::And, right);
        }
        Ok(expr)
    }

    fn equality_expr(&mut self) -> Result<Expr> {
        let mut expr = self.comparison_expr()?;
        loop {
            let op = if self.match_symbol("==") {
                BinaryOp::Eq
            } else if self.match_symbol("!=") {
                BinaryOp::Ne
            } else {
                return Ok(expr);
            };
            let right = self.comparison_expr()?;
            expr = binary(expr, op, right);
        }
    }

    fn comparison_expr(&mut self) -> Result<Expr> {
        let mut expr = self.term_expr()?;
        loop {
            let op = if self.match_symbol("<=") {
                BinaryOp::Le
            } else if self.match_symbol("<") {
                BinaryOp::Lt
            } else if self.match_symbol(">=") {
                BinaryOp::Ge
            } else if self.match_symbol(">") {
                BinaryOp::Gt
            } else {
                return Ok(expr);
            };
            let right = self.term_expr()?;
            expr = binary(expr, op, right);
        }
    }

    fn term_expr(&mut self) -> Result<Expr> {
        let mut expr = self.factor_expr()?;
        loop {
            let op = if self.match_symbol("+") {
                BinaryOp::Add
            } else if self.match_symbol("-") {
                BinaryOp::Sub
            } else {
                return Ok(expr);
            };
            let right = self.factor_expr()?;
            expr = binary(expr, op, right);
        }
    }

    fn factor_expr(&mut self) -> Result<Expr> {
        let mut expr = self.unary_expr()?;
        loop {
            let op = if self.match_symbol("*") {
                BinaryOp::Mul
            } else if self.match_symbol("/") {
                BinaryOp::Div
            } else {
                return Ok(expr);
            };
            let right = self.unary_expr()?;
            expr = binary(expr, op, right);
        }
    }

    fn unary_expr(&mut self) -> Result<Expr> {
        if self.match_symbol("!") {
            let expr = self.unary_expr()?;
            return Ok(unary(UnaryOp::Not, expr));
        }
        if self.match_symbol("-") {
            let expr = self.unary_expr()?;
            return Ok(unary(UnaryOp::Neg, expr));
        }
        if self.match_symbol("&") {
            let mutable = self.match_keyword("mut");
            let expr = self.unary_expr()?;
            return Ok(unary(UnaryOp::Ref { mutable }, expr));
        }
        if self.match_symbol("*") {
            let expr = self.unary_expr()?;
            return Ok(unary(UnaryOp::Deref, expr));
        }

        let mut expr = self.primary_expr()?;
        while self.match_symbol(".") {
            let field = self
                .expect(TokenKind::Identifier, "Expected field name after '.'")?
                .text
                .clone();
            expr = Expr::FieldAccess {
                target: Box::new(expr),
                field,
            };
        }
        Ok(expr)
    }

    fn primary_expr(&mut self) -> Result<Expr> {
        if self.match_keyword("match") {
            return self.match_expr();
        }
        if self.match_keyword("loop") {
            let body = self.block()?;
            return Ok(Expr::Loop { body });
        }
        if self.match_keyword("if") {
            return self.if_expr();
        }
        if self.match_keyword("true") {
            return Ok(Expr::Bool(true));
        }
        if self.match_keyword("false") {
            return Ok(Expr::Bool(false));
        }
        if self.check(TokenKind::Number) {
            return self.number_literal();
        }
        if self.check(TokenKind::Str) {
            let text = self.advance().text.clone();
            return Ok(Expr::Str(text));
        }
        if self.check(TokenKind::Identifier) {
            let path = self.path()?;
            if self.allow_struct_init && path.len() == 1 && self.match_symbol("{") {
                return self.struct_init(path.into_iter().next().unwrap());
            }
            if self.match_symbol("(") {
                let mut args = Vec::new();
                if !self.check_symbol(")") {
                    loop {
                        args.push(self.expression()?);
                        if !self.match_symbol(",") {
                            break;
                        }
                    }
                }
                self.expect_symbol(")")?;
                return Ok(Expr::Call { callee: path, args });
            }
            if path.len() == 1 {
                return Ok(Expr::Identifier(path.into_iter().next().unwrap()));
            }
            return Ok(Expr::Path(path));
        }
        if self.match_symbol("(") {
            let previous = self.allow_struct_init;
            self.allow_struct_init = true;
            let expr = self.expression();
            self.allow_struct_init = previous;
            let expr = expr?;
            self.expect_symbol(")")?;
            return Ok(expr);
        }
        Err(self.error_here("Expected expression"))
    }

    fn number_literal(&mut self) -> Result<Expr> {
        let token = self.advance().clone();
        match token.text.parse::<i32>() {
            Ok(value) => Ok(Expr::Number(value)),
            Err(_) => Err(self.error_at(&token, "Number literal out of range")),
        }
    }

    fn struct_init(&mut self, name: String) -> Result<Expr> {
        let mut fields = Vec::new();
        if !self.check_symbol("}") {
            loop {
                let field_name = self.expect(TokenKind::Identifier, "Expected field name")?.text.clone();
                self.expect_symbol(":")?;
                let value = self.expression()?;
                fields.push(FieldInit {
                    name: field_name,
                    value,
                });
                if !self.match_symbol(",") {
                    break;
                }
            }
        }
        self.expect_symbol("}")?;
        Ok(Expr::StructInit { name, fields })
    }

    fn if_expr(&mut self) -> Result<Expr> {
        let condition = self.guarded_expression()?;
        let then_expr = self.block_expr()?;
        if !self.match_keyword("else") {
            return Err(self.error_here("if expression requires else"));
        }
        let else_expr = if self.match_keyword("if") {
            self.if_expr()?
        } else {
            self.block_expr()?
        };
        Ok(Expr::If {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    /// A block in expression position: statements followed by a mandatory
    /// trailing value expression.
    fn block_expr(&mut self) -> Result<Expr> {
        self.expect_symbol("{")?;
        let mut statements = Vec::new();
        let mut value: Option<Expr> = None;
        while !self.check_symbol("}") && !self.is_at_end() {
            if self.check_symbol("'") {
                let label = self.label()?;
                self.expect_symbol(":")?;
                statements.push(self.labeled_loop(label)?);
                continue;
            }
            if self.match_keyword("let") {
                statements.push(self.let_stmt()?);
                continue;
            }
            if self.match_keyword("for") {
                statements.push(self.for_stmt(None)?);
                continue;
            }
            if self.match_keyword("loop") {
                statements.push(self.loop_stmt(None)?);
                continue;
            }
            if self.match_keyword("while") {
                if self.match_keyword("let") {
                    statements.push(self.while_let_stmt(None)?);
                } else {
                    statements.push(self.while_stmt(None)?);
                }
                continue;
            }
            if self.match_keyword("break") {
                statements.push(self.break_stmt()?);
                continue;
            }
            if self.match_keyword("continue") {
                statements.push(self.continue_stmt()?);
                continue;
            }
            if self.match_keyword("return") {
                statements.push(self.return_stmt()?);
                continue;
            }
            if self.check_assignment() {
                statements.push(self.assign_stmt()?);
                continue;
            }
            if self.match_keyword("if") {
                if self.match_keyword("let") {
                    statements.push(self.if_let_stmt()?);
                    continue;
                }
                let if_expr = self.if_expr()?;
                if self.match_symbol(";") {
                    statements.push(Stmt::Expression(if_expr));
                    continue;
                }
                value = Some(if_expr);
                break;
            }
            let expr = self.expression()?;
            if self.match_symbol(";") {
                statements.push(Stmt::Expression(expr));
                continue;
            }
            value = Some(expr);
            break;
        }
        self.expect_symbol("}")?;
        match value {
            Some(value) => Ok(Expr::Block {
                statements,
                value: Box::new(value),
            }),
            None => Err(self.error_here("Block expression must end with a value")),
        }
    }

    fn match_expr(&mut self) -> Result<Expr> {
        let target = self.guarded_expression()?;
        self.expect_symbol("{")?;
        let mut arms = Vec::new();
        while !self.check_symbol("}") && !self.is_at_end() {
            let pattern = self.match_pattern()?;
            let guard = if self.match_keyword("if") {
                Some(self.expression()?)
            } else {
                None
            };
            self.expect_symbol("=>")?;
            let value = if self.check_symbol("{") {
                self.block_expr()?
            } else {
                self.expression()?
            };
            arms.push(MatchArm {
                pattern,
                guard,
                value,
            });
            if self.match_symbol(",") {
                continue;
            }
            if !self.check_symbol("}") {
                return Err(self.error_here("Expected ',' or '}' after match arm"));
            }
        }
        self.expect_symbol("}")?;
        Ok(Expr::Match {
            target: Box::new(target),
            arms,
        })
    }

    fn match_pattern(&mut self) -> Result<Pattern> {
        if self.check(TokenKind::Identifier) {
            let path = self.path()?;
            if path.len() == 1 && path[0] == "_" {
                return Ok(Pattern::Wildcard);
            }
            if path.len() == 2 {
                let mut segments = path.into_iter();
                let enum_name = segments.next().unwrap();
                let variant = segments.next().unwrap();
                let binding = if self.match_symbol("(") {
                    let name = self
                        .expect(TokenKind::Identifier, "Expected binding name")?
                        .text
                        .clone();
                    self.expect_symbol(")")?;
                    Some(name)
                } else {
                    None
                };
                return Ok(Pattern::Variant {
                    enum_name,
                    variant,
                    binding,
                });
            }
            return Err(self.error_here("Unsupported match pattern"));
        }
        if self.match_keyword("true") {
            return Ok(Pattern::Bool(true));
        }
        if self.match_keyword("false") {
            return Ok(Pattern::Bool(false));
        }
        if self.check(TokenKind::Number) {
            let start = self.pattern_number()?;
            if self.match_symbol("..=") {
                let end = self.pattern_number_expected("Expected range end")?;
                return Ok(Pattern::Range {
                    start,
                    end,
                    inclusive: true,
                });
            }
            if self.match_symbol("..") {
                let end = self.pattern_number_expected("Expected range end")?;
                return Ok(Pattern::Range {
                    start,
                    end,
                    inclusive: false,
                });
            }
            return Ok(Pattern::Int(start));
        }
        if self.check(TokenKind::Str) {
            let text = self.advance().text.clone();
            return Ok(Pattern::Str(text));
        }
        Err(self.error_here("Unsupported match pattern"))
    }

    fn pattern_number(&mut self) -> Result<i32> {
        let token = self.advance().clone();
        token
            .text
            .parse::<i32>()
            .map_err(|_| self.error_at(&token, "Number literal out of range"))
    }

    fn pattern_number_expected(&mut self, message: &str) -> Result<i32> {
        self.expect(TokenKind::Number, message)?;
        let token = self.previous().clone();
        token
            .text
            .parse::<i32>()
            .map_err(|_| self.error_at(&token, "Number literal out of range"))
    }

    // Shared helpers

    fn path(&mut self) -> Result<Vec<String>> {
        let mut segments = Vec::new();
        segments.push(self.expect(TokenKind::Identifier, "Expected identifier")?.text.clone());
        while self.match_double_colon() {
            segments.push(
                self.expect(TokenKind::Identifier, "Expected identifier after '::'")?
                    .text
                    .clone(),
            );
        }
        Ok(segments)
    }

    fn type_name(&mut self) -> Result<TypeName> {
        if self.match_symbol("&") {
            let mutable = self.match_keyword("mut");
            let inner = self.type_name()?;
            return Ok(TypeName::Reference {
                inner: Box::new(inner),
                mutable,
            });
        }
        if !self.check(TokenKind::Identifier) {
            return Err(self.error_here("Expected type name"));
        }
        let path = self.path()?;
        let base = path.join("::");
        if self.match_symbol("<") {
            let mut args = Vec::new();
            loop {
                args.push(self.type_name()?);
                if !self.match_symbol(",") {
                    break;
                }
            }
            self.expect_symbol(">")?;
            return Ok(TypeName::Generic { base, args });
        }
        Ok(TypeName::Named(base))
    }

    fn label(&mut self) -> Result<String> {
        self.expect_symbol("'")?;
        Ok(self.expect(TokenKind::Identifier, "Expected label name")?.text.clone())
    }

    /// Two-token lookahead distinguishing `name = ...` statements from
    /// expression statements that merely start with an identifier.
    fn check_assignment(&self) -> bool {
        if !self.check(TokenKind::Identifier) {
            return false;
        }
        match self.tokens.get(self.index + 1) {
            Some(next) => {
                next.kind == TokenKind::Symbol && ASSIGN_SYMBOLS.contains(&next.text.as_str())
            }
            None => false,
        }
    }

    fn match_double_colon(&mut self) -> bool {
        if !self.check_symbol(":") {
            return false;
        }
        match self.tokens.get(self.index + 1) {
            Some(next) if next.is_symbol(":") => {
                self.advance();
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn check_symbol(&self, symbol: &str) -> bool {
        !self.is_at_end() && self.peek().is_symbol(symbol)
    }

    fn check_identifier(&self, text: &str) -> bool {
        !self.is_at_end() && self.peek().kind == TokenKind::Identifier && self.peek().text == text
    }

    fn match_symbol(&mut self, symbol: &str) -> bool {
        if self.check_symbol(symbol) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if !self.is_at_end() && self.peek().is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(message))
        }
    }

    fn expect_symbol(&mut self, symbol: &str) -> Result<()> {
        if self.match_symbol(symbol) {
            Ok(())
        } else {
            Err(self.error_here(&format!("Expected '{}'", symbol)))
        }
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.index += 1;
        }
        self.previous()
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.index - 1]
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index]
    }

    fn is_at_end(&self) -> bool {
        self.tokens[self.index].kind == TokenKind::Eof
    }

    fn error_here(&mut self, message: &str) -> ParseError {
        let token = self.peek().clone();
        self.error_at(&token, message)
    }

    fn error_at(&mut self, token: &Token, message: &str) -> ParseError {
        let full = format!("{} at {}", message, token.position());
        self.diagnostics
            .report(Diagnostic::new(&full, &self.source.path));
        ParseError {
            message: full,
            line: token.line,
            column: token.column,
        }
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn unary(op: UnaryOp, expr: Expr) -> Expr {
    Expr::Unary {
        op,
        expr: Box::new(expr),
    }
}
