use crate::error::Result;
use crate::lexer::{Keyword, Symbol, TokenKind};

use super::{
    parser::Parser, ArrayEntry, BinaryOp, Expr, Literal, MemberInit, PostfixOp, PrefixOp,
    ASSIGN_STRENGTH, TERNARY_STRENGTH, UNARY_STRENGTH,
};

impl<'a> Parser<'a> {
    /// Precedence climbing: folds every operator binding tighter than
    /// `floor` into the left operand. Assignments recurse one step lower so
    /// they group to the right.
    pub(super) fn parse_expression(&mut self, floor: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            if TERNARY_STRENGTH > floor && self.consume(Symbol::Question) {
                let then = self.parse_expression(0)?;
                self.expect(Symbol::Colon)?;
                let otherwise = self.parse_expression(ASSIGN_STRENGTH)?;
                lhs = Expr::Conditional(Box::new(lhs), Box::new(then), Box::new(otherwise));
                continue;
            }

            let TokenKind::Symbol(symbol) = self.peek().kind else {
                break;
            };
            let Some(op) = BinaryOp::from_symbol(symbol) else {
                break;
            };
            if op.strength() <= floor {
                break;
            }
            self.bump();

            let rhs = match op {
                BinaryOp::Member | BinaryOp::PtrMember => {
                    let name = Expr::Ident(self.expect_word()?);
                    self.parse_postfix(name)?
                }
                _ if op.is_right_assoc() => self.parse_expression(op.strength() - 1)?,
                _ => self.parse_expression(op.strength())?,
            };
            lhs = Expr::binary(op, lhs, rhs);
        }

        Ok(lhs)
    }

    /// unary = prefix-op unary | "sizeof" unary | "sizeof" "(" type-name ")"
    ///       | "(" type-name ")" unary | postfix
    fn parse_unary(&mut self) -> Result<Expr> {
        if let TokenKind::Symbol(symbol) = self.peek().kind {
            if let Some(op) = PrefixOp::from_symbol(symbol) {
                self.bump();
                let operand = self.parse_expression(UNARY_STRENGTH)?;
                return Ok(Expr::Prefix(op, Box::new(operand)));
            }
        }

        if self.consume_keyword(Keyword::Sizeof) {
            if self.check(Symbol::LParen) && self.starts_type(self.peek_at(1)) {
                let ty = self.attempt(|p| {
                    p.expect(Symbol::LParen)?;
                    let ty = p.parse_type_name()?;
                    p.expect(Symbol::RParen)?;
                    Ok(ty)
                });
                if let Some(ty) = ty {
                    return Ok(Expr::SizeofType(Box::new(ty)));
                }
            }
            let operand = self.parse_expression(UNARY_STRENGTH)?;
            return Ok(Expr::SizeofExpr(Box::new(operand)));
        }

        if self.check(Symbol::LParen) && self.starts_type(self.peek_at(1)) {
            let ty = self.attempt(|p| {
                p.expect(Symbol::LParen)?;
                let ty = p.parse_type_name()?;
                p.expect(Symbol::RParen)?;
                Ok(ty)
            });
            if let Some(ty) = ty {
                let operand = self.parse_expression(UNARY_STRENGTH)?;
                return Ok(Expr::Cast(Box::new(ty), Box::new(operand)));
            }
        }

        let atom = self.parse_atom()?;
        self.parse_postfix(atom)
    }

    /// postfix = atom ("(" args ")" | "[" expr "]" | "++" | "--")*
    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        loop {
            if self.consume(Symbol::LParen) {
                let mut args = vec![];
                if !self.consume(Symbol::RParen) {
                    loop {
                        args.push(self.parse_expression(0)?);
                        if !self.consume(Symbol::Comma) {
                            self.expect(Symbol::RParen)?;
                            break;
                        }
                    }
                }
                expr = Expr::Call(Box::new(expr), args);
            } else if self.consume(Symbol::LBracket) {
                let index = self.parse_expression(0)?;
                self.expect(Symbol::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else if self.consume(Symbol::PlusPlus) {
                expr = Expr::Postfix(PostfixOp::Inc, Box::new(expr));
            } else if self.consume(Symbol::MinusMinus) {
                expr = Expr::Postfix(PostfixOp::Dec, Box::new(expr));
            } else {
                return Ok(expr);
            }
        }
    }

    /// atom = word | number | string | char | "(" expr ")" | "{" initializer "}"
    fn parse_atom(&mut self) -> Result<Expr> {
        let expr = match &self.peek().kind {
            TokenKind::Word(w) => Expr::Ident(w.clone()),
            TokenKind::Number(n) => Expr::Literal(Literal::Number(n.clone())),
            TokenKind::String(s) => Expr::Literal(Literal::String(s.clone())),
            TokenKind::Char(c) => Expr::Literal(Literal::Char(c.clone())),
            TokenKind::Symbol(Symbol::LParen) => {
                self.bump();
                let inner = self.parse_expression(0)?;
                self.expect(Symbol::RParen)?;
                return Ok(inner);
            }
            TokenKind::Symbol(Symbol::LBrace) => {
                if self.peek_at(1).is_symbol(Symbol::Dot) {
                    return self.parse_struct_literal();
                }
                return self.parse_array_literal();
            }
            _ => return Err(self.error("expression")),
        };
        self.bump();
        Ok(expr)
    }

    /// struct-literal = "{" ("." name "=" expr ","?)* "}"
    fn parse_struct_literal(&mut self) -> Result<Expr> {
        self.expect(Symbol::LBrace)?;
        let mut members = vec![];
        while !self.consume(Symbol::RBrace) {
            self.expect(Symbol::Dot)?;
            let name = self.expect_word()?;
            self.expect(Symbol::Assign)?;
            let value = self.parse_expression(0)?;
            members.push(MemberInit { name, value });
            if !self.consume(Symbol::Comma) {
                self.expect(Symbol::RBrace)?;
                break;
            }
        }
        Ok(Expr::StructLiteral(members))
    }

    /// array-literal = "{" (("[" expr "]" "=")? expr ","?)* "}"
    fn parse_array_literal(&mut self) -> Result<Expr> {
        self.expect(Symbol::LBrace)?;
        let mut entries = vec![];
        while !self.consume(Symbol::RBrace) {
            let index = if self.consume(Symbol::LBracket) {
                let index = self.parse_expression(0)?;
                self.expect(Symbol::RBracket)?;
                self.expect(Symbol::Assign)?;
                Some(index)
            } else {
                None
            };
            let value = self.parse_expression(0)?;
            entries.push(ArrayEntry { index, value });
            if !self.consume(Symbol::Comma) {
                self.expect(Symbol::RBrace)?;
                break;
            }
        }
        Ok(Expr::ArrayLiteral(entries))
    }
}
