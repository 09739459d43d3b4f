/*
    The grammar of a simplified Lua 5.1, built with the grammar combinators.
    Every statement ends with `;`, numbers and names are assembled from
    single-character terminals, and there are no string literals.
*/

use crate::grammar::{nt, t, Alternative, Grammar, GrammarBuilder, GrammarErrors, Name};
use crate::tokenizer::Tokenizer;

pub const START_SYMBOL: &str = "chunk";
pub const STATEMENT_SEPARATOR: &str = ";";

pub const KEYWORDS: [&str; 21] = [
    "do", "end", "while", "repeat", "until", "if", "then", "elseif", "else", "for", "in",
    "local", "function", "return", "break", "nil", "false", "true", "and", "or", "not",
];

pub const MULTICHAR_OPERATORS: [&str; 6] = ["...", "<=", ">=", "==", "~=", ".."];

const BINARY_OPERATORS: [&str; 15] = [
    "+", "-", "*", "/", "^", "%", "..", "<", "<=", ">", ">=", "==", "~=", "and", "or",
];

const UNARY_OPERATORS: [&str; 3] = ["#", "-", "not"];

pub fn tokenizer() -> Tokenizer {
    Tokenizer::new(KEYWORDS, MULTICHAR_OPERATORS)
}

pub fn start_symbol() -> Name {
    Name::from(START_SYMBOL)
}

fn terminals<'a>(literals: impl IntoIterator<Item = &'a str>) -> Vec<Alternative> {
    literals.into_iter().map(|literal| vec![t(literal)]).collect()
}

fn head(name: &str) -> Option<Name> {
    Some(Name::from(name))
}

// Digits, letters, numbers and names
fn lexical(g: &mut GrammarBuilder) {
    let digits = g.alt(terminals(["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]), head("digit"));
    g.add(digits);

    let letters: Vec<String> = ('a'..='z').chain('A'..='Z').chain(['_']).map(String::from).collect();
    let letters = g.alt(terminals(letters.iter().map(String::as_str)), head("letter"));
    g.add(letters);

    let number = g.rep(vec![nt("digit")], vec![nt("digit")], head("number"));
    g.add(number);

    // Name -> letter | Name letter | Name digit
    let name_char = g.alt(vec![vec![nt("letter")], vec![nt("digit")]], None);
    let name = g.rep(vec![nt("letter")], vec![nt(&name_char[0].head)], head("Name"));
    g.add(name_char);
    g.add(name);
}

fn expressions(g: &mut GrammarBuilder) {
    let unop = g.alt(terminals(UNARY_OPERATORS), head("unop"));
    g.add(unop);
    let binop = g.alt(terminals(BINARY_OPERATORS), head("binop"));
    g.add(binop);

    let exp = g.alt(
        terminals(["nil", "false", "true", "..."]).into_iter().chain([
            vec![nt("number")],
            vec![nt("exp"), nt("binop"), nt("exp")],
            vec![nt("unop"), nt("exp")],
            vec![nt("function")],
            vec![nt("prefixexp")],
            vec![nt("tableconstructor")],
        ]),
        head("exp"),
    );
    g.add(exp);

    let prefixexp = g.alt(vec![
        vec![nt("var")],
        vec![nt("functioncall")],
        vec![t("("), nt("exp"), t(")")],
    ], head("prefixexp"));
    g.add(prefixexp);

    let var = g.alt(vec![
        vec![nt("Name")],
        vec![nt("prefixexp"), t("["), nt("exp"), t("]")],
        vec![nt("prefixexp"), t("."), nt("Name")],
    ], head("var"));
    g.add(var);

    let functioncall = g.alt(vec![
        vec![nt("prefixexp"), nt("args")],
        vec![nt("prefixexp"), t(":"), nt("Name"), nt("args")],
    ], head("functioncall"));
    g.add(functioncall);

    let args = g.alt(vec![
        vec![t("("), t(")")],
        vec![t("("), nt("explist1"), t(")")],
        vec![nt("tableconstructor")],
    ], head("args"));
    g.add(args);

    let explist = g.rep(vec![nt("exp")], vec![t(","), nt("exp")], head("explist1"));
    g.add(explist);
    let namelist = g.rep(vec![nt("Name")], vec![t(","), nt("Name")], head("namelist"));
    g.add(namelist);
    let varlist = g.rep(vec![nt("var")], vec![t(","), nt("var")], head("varlist"));
    g.add(varlist);
}

fn tables(g: &mut GrammarBuilder) {
    let constructor = g.alt(vec![
        vec![t("{"), t("}")],
        vec![t("{"), nt("fieldlist"), t("}")],
        vec![t("{"), nt("fieldlist"), nt("fieldsep"), t("}")],
    ], head("tableconstructor"));
    g.add(constructor);

    // A trailing separator is spelled out here since `rep` never accepts one
    let fieldlist = g.rep(vec![nt("field")], vec![nt("fieldsep"), nt("field")], head("fieldlist"));
    g.add(fieldlist);

    let field = g.alt(vec![
        vec![t("["), nt("exp"), t("]"), t("="), nt("exp")],
        vec![nt("Name"), t("="), nt("exp")],
        vec![nt("exp")],
    ], head("field"));
    g.add(field);

    let fieldsep = g.alt(terminals([",", ";"]), head("fieldsep"));
    g.add(fieldsep);
}

fn functions(g: &mut GrammarBuilder) {
    g.add_production("function", vec![t("function"), nt("funcbody")]);

    let funcbody = g.alt(vec![
        vec![t("("), t(")"), nt("block"), t("end")],
        vec![t("("), nt("parlist1"), t(")"), nt("block"), t("end")],
    ], head("funcbody"));
    g.add(funcbody);

    let parlist = g.alt(vec![
        vec![nt("namelist")],
        vec![t("...")],
        vec![nt("namelist"), t(","), t("...")],
    ], head("parlist1"));
    g.add(parlist);

    let path = g.rep(vec![nt("Name")], vec![t("."), nt("Name")], None);
    let funcname = g.alt(vec![
        vec![nt(&path[0].head)],
        vec![nt(&path[0].head), t(":"), nt("Name")],
    ], head("funcname"));
    g.add(path);
    g.add(funcname);
}

fn statements(g: &mut GrammarBuilder) {
    let if_chain = g.rep(
        vec![t("if"), nt("exp"), t("then"), nt("block")],
        vec![t("elseif"), nt("exp"), t("then"), nt("block")],
        None,
    );
    let chain = if_chain[0].head.clone();
    g.add(if_chain);

    let stat = g.alt(vec![
        vec![nt("varlist"), t("="), nt("explist1")],
        vec![nt("functioncall")],
        vec![t("do"), nt("block"), t("end")],
        vec![t("while"), nt("exp"), t("do"), nt("block"), t("end")],
        vec![t("repeat"), nt("block"), t("until"), nt("exp")],
        vec![nt(&chain), t("end")],
        vec![nt(&chain), t("else"), nt("block"), t("end")],
        vec![t("for"), nt("Name"), t("="), nt("exp"), t(","), nt("exp"), t("do"), nt("block"), t("end")],
        vec![
            t("for"), nt("Name"), t("="), nt("exp"), t(","), nt("exp"), t(","), nt("exp"),
            t("do"), nt("block"), t("end"),
        ],
        vec![t("for"), nt("namelist"), t("in"), nt("explist1"), t("do"), nt("block"), t("end")],
        vec![t("function"), nt("funcname"), nt("funcbody")],
        vec![t("local"), t("function"), nt("Name"), nt("funcbody")],
        vec![t("local"), nt("namelist")],
        vec![t("local"), nt("namelist"), t("="), nt("explist1")],
    ], head("stat"));
    g.add(stat);

    let laststat = g.alt(vec![
        vec![t("break")],
        vec![t("return")],
        vec![t("return"), nt("explist1")],
    ], head("laststat"));
    g.add(laststat);

    let stats = g.rep(
        vec![nt("stat"), t(STATEMENT_SEPARATOR)],
        vec![nt("stat"), t(STATEMENT_SEPARATOR)],
        head("stats"),
    );
    g.add(stats);

    // Blocks may be empty, a whole chunk may not
    let block = g.alt(vec![vec![nt("chunk")], vec![]], head("block"));
    g.add(block);
    let chunk = g.alt(vec![
        vec![nt("stats")],
        vec![nt("stats"), nt("laststat"), t(STATEMENT_SEPARATOR)],
        vec![nt("laststat"), t(STATEMENT_SEPARATOR)],
    ], head(START_SYMBOL));
    g.add(chunk);
}

pub fn build_grammar() -> Result<Grammar, GrammarErrors> {
    let mut g = GrammarBuilder::new();
    lexical(&mut g);
    expressions(&mut g);
    tables(&mut g);
    functions(&mut g);
    statements(&mut g);
    g.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognizer::{EarleySession, Recognizer};

    fn accepts(source: &str) -> bool {
        let grammar = build_grammar().unwrap();
        let mut session = EarleySession::new(&grammar, &start_symbol()).unwrap();
        tokenizer().tokenize(source).iter().all(|token| session.advance(&token.text).is_ok())
            && session.is_accepting()
    }

    #[test]
    fn grammar_verifies_and_everything_is_reachable() {
        let grammar = build_grammar().unwrap();
        assert!(grammar.unreachable_from(&start_symbol()).is_empty());
        assert!(grammar.contains(&Name::Fresh(1)));
    }

    #[test]
    fn builds_are_reproducible() {
        let first = build_grammar().unwrap();
        let second = build_grammar().unwrap();
        assert_eq!(first.productions(), second.productions());
    }

    #[test]
    fn accepts_statements() {
        let sources = vec![
            "local x = 10;",
            "local x1, y_2 = 1, 2;",
            "x = x + 1; y = -x ^ 2;",
            "g(x, y);",
            "t = {1, 2; [3] = 4, key = nil};",
            "local function f(a, b, ...) return a; end;",
            "function m.n:o() end;",
            "if x <= y then z = 1; elseif x then z = 2; else z = 3; end;",
            "for i = 1, 10, 2 do s = s .. i; end;",
            "for k, v in pairs(t) do end;",
            "while not x do x = true; end;",
            "repeat n = n - 1; until n == 0;",
            "do break; end;",
            "obj.field[1]:method{};",
        ];

        for source in sources {
            assert!(accepts(source), "{}", source);
        }
    }

    #[test]
    fn rejects_malformed_statements() {
        let sources = vec![
            "local x = 10",
            "local = 10;",
            "x = ;",
            "t = {,};",
            "if x then end",
            "return return;",
            "x + 1;",
        ];

        for source in sources {
            assert!(!accepts(source), "{}", source);
        }
    }

    #[test]
    fn laststat_closes_a_chunk() {
        assert!(accepts("x = 1; return x;"));
        assert!(accepts("return;"));
        assert!(accepts("t = {1, 2,};"));
        assert!(!accepts("x = 1; return x; y = 2;"));
    }
}
