//! Recursive-descent parser for normalized semantics.

use crate::ast::{Assign, BinOp, Expr, LogOp, RelOp, Stmt, UnOp};
use crate::lexer::{Token, TokenKind, lex};
use crate::{Result, SemError};

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, expected: &str) -> SemError {
        let (pos, found) = self.peek().map_or_else(
            || {
                (
                    self.tokens.last().map_or(0, |t| t.pos + t.text.len()),
                    "end of input".to_string(),
                )
            },
            |t| (t.pos, t.text.clone()),
        );
        SemError::Parse {
            pos,
            expected: expected.to_string(),
            found,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&'a Token> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.error(expected)),
        }
    }

    fn body(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.peek().is_some() {
            stmts.push(self.stmt()?);
        }
        Ok(stmts)
    }

    fn stmt(&mut self) -> Result<Stmt> {
        let Some(kind) = self.peek_kind() else {
            return Err(self.error("statement"));
        };
        match kind {
            TokenKind::If => {
                self.pos += 1;
                let cond = self.paren_expr()?;
                let then = Box::new(self.stmt()?);
                let els = if self.eat(TokenKind::Else) {
                    Some(Box::new(self.stmt()?))
                } else {
                    None
                };
                Ok(Stmt::If { cond, then, els })
            }
            TokenKind::While => {
                self.pos += 1;
                let cond = self.paren_expr()?;
                let body = Box::new(self.stmt()?);
                Ok(Stmt::While { cond, body })
            }
            TokenKind::For => self.for_stmt(),
            TokenKind::Return => {
                self.pos += 1;
                let value = if self.check(TokenKind::Semi) {
                    None
                } else {
                    Some(self.expr()?)
                };
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Return(value))
            }
            TokenKind::LBrace => {
                self.pos += 1;
                let mut stmts = Vec::new();
                while !self.eat(TokenKind::RBrace) {
                    if self.peek().is_none() {
                        return Err(self.error("'}'"));
                    }
                    stmts.push(self.stmt()?);
                }
                Ok(Stmt::Block(stmts))
            }
            TokenKind::Semi => {
                self.pos += 1;
                Ok(Stmt::Empty)
            }
            TokenKind::Cancel => {
                self.pos += 1;
                self.expect(TokenKind::Semi, "';' after CANCEL")?;
                Ok(Stmt::Cancel)
            }
            k if k.is_id()
                && matches!(
                    self.peek_nth_kind(1),
                    Some(TokenKind::Assign | TokenKind::AssignOp)
                ) =>
            {
                let assign = self.assign()?;
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Assign(assign))
            }
            _ => self.expr_stmt(),
        }
    }

    /// `for ([assg]; [e]; [assg]) s`
    fn for_stmt(&mut self) -> Result<Stmt> {
        self.pos += 1;
        self.expect(TokenKind::LParen, "'(' after for")?;
        let init = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.assign()?)
        };
        self.expect(TokenKind::Semi, "';'")?;
        let cond = if self.check(TokenKind::Semi) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semi, "';'")?;
        let step = if self.check(TokenKind::RParen) {
            None
        } else {
            Some(self.assign()?)
        };
        self.expect(TokenKind::RParen, "')'")?;
        let body = Box::new(self.stmt()?);
        Ok(Stmt::For {
            init,
            cond,
            step,
            body,
        })
    }

    /// A call statement or the `c ? (a) : (b)` sugar.
    fn expr_stmt(&mut self) -> Result<Stmt> {
        let expr = self.expr()?;
        if self.eat(TokenKind::Question) {
            let then = self.paren_assign()?;
            self.expect(TokenKind::Colon, "':'")?;
            let els = self.paren_assign()?;
            return Ok(Stmt::If {
                cond: expr,
                then: Box::new(Stmt::Assign(then)),
                els: Some(Box::new(Stmt::Assign(els))),
            });
        }
        match expr {
            Expr::Call { name, args } => {
                self.expect(TokenKind::Semi, "';'")?;
                Ok(Stmt::Call { name, args })
            }
            _ => Err(self.error("'?' or '='")),
        }
    }

    fn paren_assign(&mut self) -> Result<Assign> {
        self.expect(TokenKind::LParen, "'('")?;
        let assign = self.assign()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(assign)
    }

    /// `id = e` or `id op= e`.
    fn assign(&mut self) -> Result<Assign> {
        let target = match self.peek() {
            Some(t) if t.kind.is_id() => t,
            _ => return Err(self.error("assignment target")),
        };
        self.pos += 1;
        let op = match self.peek() {
            Some(t) if t.kind == TokenKind::Assign => None,
            Some(t) if t.kind == TokenKind::AssignOp => BinOp::from_symbol(&t.text),
            _ => return Err(self.error("'='")),
        };
        self.pos += 1;
        let value = self.expr()?;
        Ok(Assign {
            target: target.clone(),
            op,
            value,
        })
    }

    fn paren_expr(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen, "'('")?;
        let expr = self.expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        Ok(expr)
    }

    fn expr(&mut self) -> Result<Expr> {
        self.logical()
    }

    fn logical(&mut self) -> Result<Expr> {
        let mut expr = self.relational()?;
        while let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::LogOp) {
            self.pos += 1;
            let op = if tok.text == "&&" { LogOp::And } else { LogOp::Or };
            let right = self.relational()?;
            expr = Expr::Logical {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn relational(&mut self) -> Result<Expr> {
        let mut expr = self.binary()?;
        while let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::RelOp) {
            let Some(op) = RelOp::from_symbol(&tok.text) else {
                return Err(self.error("relational operator"));
            };
            self.pos += 1;
            let right = self.binary()?;
            expr = Expr::Relational {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn binary(&mut self) -> Result<Expr> {
        let mut expr = self.unary()?;
        while let Some(tok) = self.peek().filter(|t| t.kind == TokenKind::BinOp) {
            let Some(op) = BinOp::from_symbol(&tok.text) else {
                return Err(self.error("binary operator"));
            };
            self.pos += 1;
            let right = self.unary()?;
            expr = Expr::Binary {
                op,
                left: Box::new(expr),
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        let op = match self.peek() {
            Some(t) if t.kind == TokenKind::BinOp && t.text == "-" => UnOp::Neg,
            Some(t) if t.kind == TokenKind::Bang => UnOp::Not,
            Some(t) if t.kind == TokenKind::Tilde => UnOp::BitNot,
            _ => return self.primary(),
        };
        self.pos += 1;
        let expr = self.unary()?;
        Ok(Expr::Unary {
            op,
            expr: Box::new(expr),
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let Some(tok) = self.peek() else {
            return Err(self.error("expression"));
        };
        match tok.kind {
            TokenKind::LParen => self.paren_expr(),
            TokenKind::IntCon => {
                self.pos += 1;
                Ok(Expr::IntCon(tok.clone()))
            }
            TokenKind::StringCon => {
                self.pos += 1;
                Ok(Expr::StrCon(tok.clone()))
            }
            k if k.is_id() => {
                self.pos += 1;
                if self.eat(TokenKind::LParen) {
                    let args = self.args()?;
                    return Ok(Expr::Call {
                        name: tok.clone(),
                        args,
                    });
                }
                if self.check(TokenKind::LBracket) {
                    return Err(SemError::Parse {
                        pos: tok.pos,
                        expected: "unindexed operand".to_string(),
                        found: format!("{}[", tok.text),
                    });
                }
                Ok(Expr::Id(tok.clone()))
            }
            _ => Err(self.error("expression")),
        }
    }

    /// Call arguments after the opening parenthesis.
    fn args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(TokenKind::RParen) {
                return Ok(args);
            }
            self.expect(TokenKind::Comma, "',' or ')'")?;
        }
    }
}

/// Parse classified tokens into a statement list.
///
/// # Errors
///
/// Returns [`SemError::Parse`] at the first token that fits no rule.
pub fn parse_tokens(tokens: &[Token]) -> Result<Vec<Stmt>> {
    Parser::new(tokens).body()
}

/// Lex and parse normalized semantics text.
///
/// # Errors
///
/// Returns lexing or parse errors.
pub fn parse(src: &str) -> Result<Vec<Stmt>> {
    parse_tokens(&lex(src)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single(src: &str) -> Stmt {
        let mut stmts = parse(src).unwrap();
        assert_eq!(stmts.len(), 1);
        stmts.remove(0)
    }

    fn assign_value(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Assign(a) => a.value.to_string(),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn test_block_of_calls() {
        let Stmt::Block(stmts) = single("{fIMMEXT(siV);fSTORE(1,4,EA,RtV);}") else {
            panic!("expected block");
        };
        assert_eq!(stmts.len(), 2);
        assert!(matches!(
            &stmts[1],
            Stmt::Call { name, args } if name.text == "fSTORE" && args.len() == 4
        ));
    }

    #[test]
    fn test_binary_left_assoc() {
        let stmt = single("RxV=RxV+RsV+RtV;");
        assert_eq!(assign_value(&stmt), "((RxV+RsV)+RtV)");
    }

    #[test]
    fn test_precedence_levels() {
        assert_eq!(assign_value(&single("RdV=RsV&1<<uiV!=0;")), "(((RsV&1)<<uiV)!=0)");
        assert_eq!(assign_value(&single("RdV=-RsV+1;")), "(-RsV+1)");
        assert_eq!(assign_value(&single("RdV=RsV&(~RtV);")), "(RsV&~RtV)");
    }

    #[test]
    fn test_compound_assignment() {
        let Stmt::Assign(a) = single("RxV^=(RsV&RtV);") else {
            panic!("expected assignment");
        };
        assert_eq!(a.target.text, "RxV");
        assert_eq!(a.op, Some(BinOp::Xor));
        assert_eq!(a.value.to_string(), "(RsV&RtV)");
    }

    #[test]
    fn test_ternary_is_if_else() {
        // The ternary takes no ';', so the trailing one is an empty statement.
        let mut stmts = parse("(fLSBOLD(PuV))?(RdV=siV):(RdV=SiV);").unwrap();
        assert_eq!(stmts.pop(), Some(Stmt::Empty));
        let Some(Stmt::If { cond, then, els }) = stmts.pop() else {
            panic!("expected if");
        };
        assert_eq!(cond.to_string(), "fLSBOLD(PuV)");
        assert_eq!(assign_value(&then), "siV");
        assert_eq!(assign_value(&els.unwrap()), "SiV");
    }

    #[test]
    fn test_if_else_and_empty() {
        let stmt = single("if(fLSBOLD(PuV)){RdV=1;}else{;}");
        let Stmt::If { els: Some(els), .. } = stmt else {
            panic!("expected if/else");
        };
        assert_eq!(*els, Stmt::Block(vec![Stmt::Empty]));
    }

    #[test]
    fn test_loops_and_return_parse() {
        assert!(matches!(single("while(RsV){RsV=RsV-1;}"), Stmt::While { .. }));
        assert!(matches!(
            single("for(tmp=0;tmp<4;tmp=tmp+1)RdV=tmp;"),
            Stmt::For { init: Some(_), cond: Some(_), step: Some(_), .. }
        ));
        assert!(matches!(single("for(;;);"), Stmt::For { init: None, cond: None, step: None, .. }));
        assert!(matches!(single("return;"), Stmt::Return(None)));
        assert!(matches!(single("CANCEL;"), Stmt::Cancel));
    }

    #[test]
    fn test_indexing_rejected() {
        assert!(matches!(
            parse("RdV=RsV[0];"),
            Err(SemError::Parse { pos: 4, ref found, .. }) if found == "RsV["
        ));
    }

    #[test]
    fn test_errors_carry_position() {
        assert!(matches!(
            parse("{RdV=RsV"),
            Err(SemError::Parse { pos: 8, ref found, .. }) if found == "end of input"
        ));
        assert!(matches!(
            parse("RdV+1;"),
            Err(SemError::Parse { pos: 5, .. })
        ));
        assert!(matches!(
            parse("fFOO(RsV) RdV=1;"),
            Err(SemError::Parse { pos: 10, .. })
        ));
    }
}
