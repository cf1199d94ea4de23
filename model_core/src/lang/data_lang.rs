//! Data-language cursor heuristics and scope classification.

use super::{
    join_tokens, parse_section_heading, texts_between, BraceClassification, ScopeRules,
    SectionHeading,
};
use crate::cursor::TokenCursor;
use crate::scope::BraceCategory;
use crate::token::{Token, TokenKind};

/// Infix pipe operators: the native `|>` and user-defined `%...%` forms.
fn is_pipe(token: &Token) -> bool {
    token.kind == TokenKind::Operator
        && (token.is("|>")
            || (token.text.len() >= 2
                && token.text.starts_with('%')
                && token.text.ends_with('%')))
}

fn is_extraction(token: &Token) -> bool {
    token.is("$") || token.is("@") || token.is("::") || token.is(":::")
}

/// Chain-walking heuristics for the data language.
///
/// Every method either succeeds and repositions the cursor or fails and
/// leaves it untouched.
pub trait ChainCursor {
    /// Moves to the start of the evaluation context the current token
    /// belongs to: walks backward over matched brackets and extraction
    /// operators (`$`, `@`, `::`) as long as each preceding token is
    /// identifier-like, stopping at the first token that breaks the chain.
    fn bwd_over_evaluation_context(&mut self) -> bool;

    /// Moves to the head of an infix pipe chain (`head %>% f() |> g()`).
    fn bwd_to_chain_head(&mut self) -> bool;

    /// Moves to the first token of the statement containing the cursor.
    fn bwd_to_statement_start(&mut self) -> bool;
}

impl ChainCursor for TokenCursor<'_> {
    fn bwd_over_evaluation_context(&mut self) -> bool {
        let mut probe = *self;
        match probe.current_token() {
            Some(t) if t.is_identifier_like() || t.is(")") || t.is("]") => {}
            _ => return false,
        }
        loop {
            let token = probe.current_token().expect("probe is on a token");
            if token.is(")") || token.is("]") {
                if !probe.bwd_to_matching_token() {
                    break;
                }
                // A call target before the bracket continues the chain.
                let mut before = probe;
                if before.move_to_previous_token()
                    && matches!(before.current_token(), Some(t) if t.is_identifier_like())
                {
                    probe = before;
                    continue;
                }
                break;
            }
            let mut op = probe;
            if !op.move_to_previous_token() {
                break;
            }
            let op_token = op.current_token().expect("moved onto a token");
            if is_extraction(op_token) {
                let mut prev = op;
                if prev.move_to_previous_token()
                    && matches!(prev.current_token(), Some(t) if t.is_identifier_like() || t.is(")") || t.is("]"))
                {
                    probe = prev;
                    continue;
                }
            }
            break;
        }
        *self = probe;
        true
    }

    fn bwd_to_chain_head(&mut self) -> bool {
        let mut probe = *self;
        if !probe.bwd_over_evaluation_context() {
            return false;
        }
        loop {
            let mut op = probe;
            if !op.move_to_previous_token() {
                break;
            }
            if !matches!(op.current_token(), Some(t) if is_pipe(t)) {
                break;
            }
            let mut segment = op;
            if !segment.move_to_previous_token() {
                break;
            }
            if !segment.bwd_over_evaluation_context() {
                break;
            }
            probe = segment;
        }
        *self = probe;
        true
    }

    fn bwd_to_statement_start(&mut self) -> bool {
        if self.current_token().is_none() {
            return false;
        }
        let mut probe = *self;
        // Starting on a closer: the whole group belongs to the statement.
        if matches!(probe.current_token(), Some(t) if t.is(")") || t.is("]")) {
            probe.bwd_to_matching_token();
        }
        loop {
            let mut back = probe;
            if !back.move_to_previous_token() {
                break;
            }
            let token = back.current_token().expect("moved onto a token");
            if token.is(")") || token.is("]") {
                // A group ending on an earlier row completes an
                // expression; the statement starts on this row.
                if back.row() < probe.row() || !back.bwd_to_matching_token() {
                    break;
                }
                probe = back;
                continue;
            }
            if token.is(";") || token.is("{") || token.is("}") || token.is("(") || token.is("[")
                || token.is(",")
            {
                break;
            }
            // Crossing a row boundary only continues the statement when
            // the previous row ends with a connector.
            if back.row() < probe.row()
                && !(token.kind == TokenKind::Operator || token.is(","))
            {
                break;
            }
            probe = back;
        }
        *self = probe;
        true
    }
}

/// Scope classification for the data language.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataLangScopeRules;

impl ScopeRules for DataLangScopeRules {
    fn classify_brace(&self, at_brace: &TokenCursor) -> BraceClassification {
        let mut before = *at_brace;
        if !before.move_to_previous_token() {
            return BraceClassification::anonymous();
        }
        let prev = before.current_token().expect("moved onto a token");

        // name <- function(args) { ... } or an anonymous function(args) {
        if prev.is(")") {
            let close_paren = before;
            let mut open = before;
            if open.bwd_to_matching_token() {
                let mut kw = open;
                if kw.move_to_previous_token()
                    && matches!(kw.current_token(), Some(t) if t.is_keyword("function"))
                {
                    let args = texts_between(open, &close_paren, 24)
                        .map(|texts| join_tokens(texts.iter().map(|s| s.as_str())));

                    let mut assign = kw;
                    if assign.move_to_previous_token() {
                        let op = assign.current_token().expect("moved onto a token");
                        if op.is("<-") || op.is("<<-") || op.is("=") {
                            let mut name = assign;
                            if name.move_to_previous_token() {
                                if let Some(n) = name.current_token() {
                                    if n.kind == TokenKind::Identifier {
                                        let label = args
                                            .map(|a| format!("{}{}", n.text, a))
                                            .unwrap_or_else(|| format!("{}(...)", n.text));
                                        return BraceClassification {
                                            category: BraceCategory::Function,
                                            label: Some(label),
                                            preamble: Some(name.position()),
                                        };
                                    }
                                }
                            }
                        }
                    }
                    // No assignment target: an anonymous function value.
                    return BraceClassification {
                        category: BraceCategory::Lambda,
                        label: None,
                        preamble: Some(kw.position()),
                    };
                }
            }
        }

        // test_that("description", { ... })
        if prev.is(",") {
            let mut desc = before;
            if desc.move_to_previous_token()
                && matches!(desc.current_token(), Some(t) if t.kind == TokenKind::StringLit)
            {
                let text = desc.current_token().expect("string token").text.clone();
                let mut paren = desc;
                if paren.move_to_previous_token()
                    && matches!(paren.current_token(), Some(t) if t.is("("))
                {
                    let mut callee = paren;
                    if callee.move_to_previous_token()
                        && matches!(callee.current_token(), Some(t) if t.is("test_that"))
                    {
                        let label = text.trim_matches(|c| c == '"' || c == '\'').to_string();
                        return BraceClassification {
                            category: BraceCategory::Test,
                            label: Some(label),
                            preamble: Some(callee.position()),
                        };
                    }
                }
            }
        }

        BraceClassification::anonymous()
    }

    fn section(&self, token: &Token) -> Option<SectionHeading> {
        if token.kind != TokenKind::Comment {
            return None;
        }
        parse_section_heading(&token.text, '#')
    }

    fn chunk_start(&self, token: &Token) -> Option<Option<String>> {
        if token.column != 0 || !token.text.starts_with("```{") {
            return None;
        }
        let label = token
            .text
            .trim_start_matches("```{")
            .trim_end()
            .trim_end_matches('}')
            .trim();
        Some(if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        })
    }

    fn chunk_end(&self, token: &Token) -> bool {
        token.column == 0 && token.text.trim_end() == "```"
    }
}
