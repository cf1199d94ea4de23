//! C-family cursor heuristics and scope classification.

use super::{
    join_tokens, parse_section_heading, texts_between, BraceClassification, ScopeRules,
    SectionHeading,
};
use crate::cursor::TokenCursor;
use crate::document::Position;
use crate::scope::BraceCategory;
use crate::token::{Token, TokenKind};

/// Keywords that may trail a function signature before its body.
fn is_trailing_qualifier(token: &Token) -> bool {
    token.is_keyword("const")
        || token.is_keyword("noexcept")
        || token.is_keyword("volatile")
        || token.is_keyword("override")
        || token.is_keyword("final")
        || token.is_keyword("mutable")
}

/// Keywords that may appear inside a return type.
fn is_type_keyword(token: &Token) -> bool {
    matches!(
        token.text.as_str(),
        "const" | "unsigned" | "signed" | "long" | "short" | "int" | "char" | "bool" | "void"
            | "auto" | "float" | "double" | "static" | "inline" | "virtual" | "constexpr"
            | "typename" | "explicit"
    ) && token.kind == TokenKind::Keyword
}

/// C-family navigation heuristics layered on the base cursor.
///
/// Every method either succeeds and repositions the cursor or fails and
/// leaves it untouched.
pub trait CFamilyCursor {
    /// From a `>` (or `>>`) token, moves back over the matching template
    /// argument list, landing on the opening `<`.
    fn bwd_over_template_args(&mut self) -> bool;

    /// Skips backward over trailing function qualifiers -- `const`,
    /// `noexcept`, `noexcept(...)`, `decltype(...)` groups and friends --
    /// landing on the `)` that closes the parameter list.
    fn bwd_over_qualifiers(&mut self) -> bool;

    /// From the token before an opening brace, moves back over a
    /// constructor initializer list, landing on the `)` that closes the
    /// constructor's parameter list.
    fn bwd_over_initializer_list(&mut self) -> bool;

    /// From the token before an opening brace, moves back over a class
    /// inheritance list, landing on the class name before the `:`.
    fn bwd_over_inheritance_list(&mut self) -> bool;
}

impl CFamilyCursor for TokenCursor<'_> {
    fn bwd_over_template_args(&mut self) -> bool {
        let mut depth: i32 = match self.current_token() {
            Some(t) if t.is(">") => 1,
            Some(t) if t.is(">>") => 2,
            _ => return false,
        };
        let mut probe = *self;
        while probe.move_to_previous_token() {
            let token = probe.current_token().expect("moved onto a token");
            if token.is_comment_or_string() {
                continue;
            }
            if token.is(">") {
                depth += 1;
            } else if token.is(">>") {
                depth += 2;
            } else if token.is("<") {
                depth -= 1;
            } else if token.is("<<") {
                depth -= 2;
            } else if token.is(";") || token.is("{") || token.is("}") {
                return false;
            }
            if depth <= 0 {
                if depth < 0 {
                    return false;
                }
                *self = probe;
                return true;
            }
        }
        false
    }

    fn bwd_over_qualifiers(&mut self) -> bool {
        let mut probe = *self;
        loop {
            let token = match probe.current_token() {
                Some(t) => t,
                None => return false,
            };
            if token.is(")") {
                // This may close a noexcept(...)/decltype(...) group
                // rather than the parameter list itself.
                let mut group = probe;
                if group.bwd_to_matching_token() {
                    let mut before = group;
                    if before.move_to_previous_token() {
                        let kw = before.current_token().expect("moved onto a token");
                        if kw.is_keyword("noexcept") || kw.is_keyword("decltype") {
                            if !before.move_to_previous_token() {
                                return false;
                            }
                            probe = before;
                            continue;
                        }
                    }
                }
                *self = probe;
                return true;
            }
            if is_trailing_qualifier(token) {
                if !probe.move_to_previous_token() {
                    return false;
                }
                continue;
            }
            return false;
        }
    }

    fn bwd_over_initializer_list(&mut self) -> bool {
        let mut probe = *self;
        loop {
            // One member initializer, walked backward: a paren or brace
            // group preceded by the member name.
            match probe.current_token() {
                Some(t) if t.is(")") || t.is("}") => {
                    if !probe.bwd_to_matching_token() {
                        return false;
                    }
                    if !probe.move_to_previous_token() {
                        return false;
                    }
                    let name = probe.current_token().expect("moved onto a token");
                    if name.kind != TokenKind::Identifier {
                        return false;
                    }
                }
                _ => return false,
            }
            if !probe.move_to_previous_token() {
                return false;
            }
            let sep = probe.current_token().expect("moved onto a token");
            if sep.is(",") {
                if !probe.move_to_previous_token() {
                    return false;
                }
                continue;
            }
            if sep.is(":") {
                // A colon preceded by an access specifier is a label, not
                // an initializer list.
                if let Some(before) = probe.peek_bwd(1) {
                    if before.is_keyword("public")
                        || before.is_keyword("private")
                        || before.is_keyword("protected")
                    {
                        return false;
                    }
                }
                if !probe.move_to_previous_token() {
                    return false;
                }
                *self = probe;
                return true;
            }
            return false;
        }
    }

    fn bwd_over_inheritance_list(&mut self) -> bool {
        let mut probe = *self;
        loop {
            let token = match probe.current_token() {
                Some(t) => t,
                None => return false,
            };
            if token.is(":") {
                if !probe.move_to_previous_token() {
                    return false;
                }
                let name = probe.current_token().expect("moved onto a token");
                if name.kind != TokenKind::Identifier {
                    return false;
                }
                *self = probe;
                return true;
            }
            if token.is(">") || token.is(">>") {
                if !probe.bwd_over_template_args() {
                    return false;
                }
                if !probe.move_to_previous_token() {
                    return false;
                }
                continue;
            }
            let acceptable = token.kind == TokenKind::Identifier
                || token.is(",")
                || token.is("::")
                || token.is_keyword("public")
                || token.is_keyword("private")
                || token.is_keyword("protected")
                || token.is_keyword("virtual");
            if !acceptable {
                return false;
            }
            if !probe.move_to_previous_token() {
                return false;
            }
        }
    }
}

/// Scope classification for C-family sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct CFamilyScopeRules;

impl CFamilyScopeRules {
    /// Walks back from the function name over its return type, landing on
    /// the first token of the declaration.
    fn bwd_over_return_type(name: TokenCursor) -> TokenCursor {
        let mut head = name;
        loop {
            let mut back = head;
            if !back.move_to_previous_token() {
                break;
            }
            let token = back.current_token().expect("moved onto a token");
            if token.is(">") || token.is(">>") {
                if back.bwd_over_template_args() {
                    head = back;
                    continue;
                }
                break;
            }
            let type_ish = token.kind == TokenKind::Identifier
                || is_type_keyword(token)
                || token.is("::")
                || token.is("*")
                || token.is("&")
                || token.is("~");
            if !type_ish {
                break;
            }
            head = back;
        }
        head
    }

    /// Attempts a human-readable function label; failure degrades to an
    /// unlabeled placeholder.
    fn function_label(
        name: TokenCursor,
        close_paren: &TokenCursor,
    ) -> (Option<String>, Option<Position>) {
        let head = Self::bwd_over_return_type(name);
        let preamble = Some(head.position());
        match texts_between(head, close_paren, 24) {
            Some(texts) => {
                let label = join_tokens(texts.iter().map(|s| s.as_str()));
                (Some(label), preamble)
            }
            None => {
                // Long signature: keep the name, elide the arguments.
                let label = name
                    .current_token()
                    .map(|t| format!("{}(...)", t.text));
                (label, preamble)
            }
        }
    }
}

impl ScopeRules for CFamilyScopeRules {
    fn classify_brace(&self, at_brace: &TokenCursor) -> BraceClassification {
        let mut before = *at_brace;
        if !before.move_to_previous_token() {
            return BraceClassification::anonymous();
        }
        let prev = before.current_token().expect("moved onto a token");

        // 1. namespace { ... } and namespace name { ... }
        if prev.is_keyword("namespace") {
            return BraceClassification {
                category: BraceCategory::Namespace,
                label: None,
                preamble: Some(before.position()),
            };
        }
        if prev.kind == TokenKind::Identifier {
            if let Some(two_back) = before.peek_bwd(1) {
                if two_back.is_keyword("namespace") {
                    let mut kw = before;
                    kw.move_to_previous_token();
                    return BraceClassification {
                        category: BraceCategory::Namespace,
                        label: Some(prev.text.clone()),
                        preamble: Some(kw.position()),
                    };
                }
            }
        }

        // 2. class/struct, directly named or behind an inheritance list
        let mut class_name = before;
        let named_directly = prev.kind == TokenKind::Identifier
            && matches!(before.peek_bwd(1), Some(t) if t.is_keyword("class") || t.is_keyword("struct"));
        let found_class = named_directly || class_name.bwd_over_inheritance_list();
        if found_class {
            let name = class_name.current_token().expect("class name token");
            if matches!(class_name.peek_bwd(1), Some(t) if t.is_keyword("class") || t.is_keyword("struct"))
            {
                let mut kw = class_name;
                kw.move_to_previous_token();
                return BraceClassification {
                    category: BraceCategory::Class,
                    label: Some(name.text.clone()),
                    preamble: Some(kw.position()),
                };
            }
        }

        // 3. function or lambda: a parameter list, possibly behind a
        // constructor initializer list or trailing qualifiers. The
        // initializer list is probed first: the token before the brace is
        // a `)` in both cases, but it closes a member initializer, not
        // the parameter list.
        let mut close = before;
        let at_params = if close.bwd_over_initializer_list() {
            matches!(close.current_token(), Some(t) if t.is(")"))
        } else {
            close = before;
            close.bwd_over_qualifiers()
        };
        if at_params {
            let close_paren = close;
            let mut open = close;
            if open.bwd_to_matching_token() {
                let mut callee = open;
                if callee.move_to_previous_token() {
                    let token = callee.current_token().expect("moved onto a token");
                    if token.is("]") {
                        // Lambda capture list: the preamble is the `[`.
                        let mut capture = callee;
                        if capture.bwd_to_matching_token() {
                            return BraceClassification {
                                category: BraceCategory::Lambda,
                                label: None,
                                preamble: Some(capture.position()),
                            };
                        }
                    }
                    if token.kind == TokenKind::Identifier {
                        let (label, preamble) = Self::function_label(callee, &close_paren);
                        return BraceClassification {
                            category: BraceCategory::Function,
                            label,
                            preamble,
                        };
                    }
                }
            }
        }

        // 4. anything else is an anonymous brace scope
        BraceClassification::anonymous()
    }

    fn section(&self, token: &Token) -> Option<SectionHeading> {
        if token.kind != TokenKind::Comment || !token.text.starts_with("//") {
            return None;
        }
        let mut heading = parse_section_heading(&token.text, '/')?;
        // "//" is depth one, each extra slash goes one deeper.
        heading.depth = heading.depth.saturating_sub(1).max(1);
        Some(heading)
    }

    fn chunk_start(&self, _token: &Token) -> Option<Option<String>> {
        None
    }

    fn chunk_end(&self, _token: &Token) -> bool {
        false
    }
}
