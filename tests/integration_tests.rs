// Parser robustness tests: malformed inputs must come back as syntax or
// lexical errors, never panics, and valid programs must parse.

use js2py::error::Error;
use js2py::lexer::Lexer;
use js2py::parser::Parser;

/// Test result for a single test case
#[derive(Debug)]
pub enum TestResult {
    Pass,
    Fail(String),
    Crash(String),
}

/// Individual test case
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub input: String,
    pub should_succeed: bool,
    pub expected_error_contains: Option<String>,
}

impl TestCase {
    pub fn should_succeed(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: true,
            expected_error_contains: None,
        }
    }

    pub fn should_fail(name: &str, input: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: None,
        }
    }

    pub fn should_fail_with_message(name: &str, input: &str, expected_msg: &str) -> Self {
        Self {
            name: name.to_string(),
            input: input.to_string(),
            should_succeed: false,
            expected_error_contains: Some(expected_msg.to_string()),
        }
    }
}

/// Test suite containing multiple test cases
#[derive(Debug)]
pub struct TestSuite {
    pub name: String,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tests: Vec::new(),
        }
    }

    pub fn add_test(&mut self, test: TestCase) {
        self.tests.push(test);
    }

    pub fn run(&self) -> TestSuiteResults {
        let mut results = TestSuiteResults::new(&self.name);

        println!("Running test suite: {}", self.name);
        println!("{}", "=".repeat(50));

        for test in &self.tests {
            let result = run_single_test(test);
            results.add_result(&test.name, result);
        }

        results.print_summary();
        results
    }
}

/// Results for a test suite run
#[derive(Debug)]
pub struct TestSuiteResults {
    pub suite_name: String,
    pub results: Vec<(String, TestResult)>,
    pub passed: usize,
    pub failed: usize,
    pub crashed: usize,
}

impl TestSuiteResults {
    pub fn new(suite_name: &str) -> Self {
        Self {
            suite_name: suite_name.to_string(),
            results: Vec::new(),
            passed: 0,
            failed: 0,
            crashed: 0,
        }
    }

    pub fn add_result(&mut self, test_name: &str, result: TestResult) {
        match &result {
            TestResult::Pass => {
                self.passed += 1;
                println!("  ✓ {}", test_name);
            }
            TestResult::Fail(msg) => {
                self.failed += 1;
                println!("  ✗ {}: {}", test_name, msg);
            }
            TestResult::Crash(msg) => {
                self.crashed += 1;
                println!("  💥 {}: CRASHED - {}", test_name, msg);
            }
        }
        self.results.push((test_name.to_string(), result));
    }

    pub fn print_summary(&self) {
        println!();
        println!("Test Suite: {} - Summary", self.suite_name);
        println!("{}", "-".repeat(30));
        println!("Passed:  {}", self.passed);
        println!("Failed:  {}", self.failed);
        println!("Crashed: {}", self.crashed);
        println!("Total:   {}", self.results.len());
        println!();
    }

    pub fn is_all_passed(&self) -> bool {
        self.crashed == 0 && self.failed == 0
    }
}

fn run_single_test(test: &TestCase) -> TestResult {
    // Catch panics to detect crashes
    let result = std::panic::catch_unwind(|| parse_input(&test.input));

    match result {
        Ok(parse_result) => match (parse_result, test.should_succeed) {
            (Ok(_), true) => TestResult::Pass,
            (Ok(_), false) => {
                TestResult::Fail("Expected parsing to fail, but it succeeded".to_string())
            }
            (Err(error), false) => {
                if let Some(expected) = &test.expected_error_contains {
                    if error.message.contains(expected) {
                        TestResult::Pass
                    } else {
                        TestResult::Fail(format!(
                            "Error message '{}' doesn't contain expected text '{}'",
                            error.message, expected
                        ))
                    }
                } else {
                    TestResult::Pass
                }
            }
            (Err(error), true) => TestResult::Fail(format!(
                "Expected parsing to succeed, but got error: {}",
                error.message
            )),
        },
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else {
                "Unknown panic".to_string()
            };
            TestResult::Crash(panic_msg)
        }
    }
}

fn parse_input(input: &str) -> Result<js2py::ast::Program, Error> {
    let mut lexer = Lexer::new(input.to_string());
    let tokens = lexer.scan_tokens()?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}

// ============================================================================
// Test Suite Creation Functions
// ============================================================================

fn create_declaration_tests() -> TestSuite {
    let mut suite = TestSuite::new("Declarations");

    suite.add_test(TestCase::should_succeed("var_number", "var x = 10;"));
    suite.add_test(TestCase::should_succeed("let_string", "let s = 'hi';"));
    suite.add_test(TestCase::should_succeed("const_bool", "const b = true;"));
    suite.add_test(TestCase::should_succeed("uninitialized", "var x;"));
    suite.add_test(TestCase::should_succeed(
        "array_literal",
        "var arr = [1, 2, 3];",
    ));
    suite.add_test(TestCase::should_succeed(
        "object_literal",
        "var o = {a: 1, b: 'x'};",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "missing_semicolon",
        "var x = 10",
        "Expected ';'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_name",
        "var = 10;",
        "Expected variable name",
    ));
    suite.add_test(TestCase::should_fail("missing_value", "var x = ;"));
    suite.add_test(TestCase::should_fail(
        "unclosed_object",
        "var o = {a: 1;",
    ));
    suite.add_test(TestCase::should_fail(
        "unclosed_array",
        "var arr = [1, 2;",
    ));

    suite
}

fn create_arrow_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Arrow Functions");

    suite.add_test(TestCase::should_succeed(
        "expression_body",
        "var f = (a, b) => a + b;",
    ));
    suite.add_test(TestCase::should_succeed(
        "block_body",
        "var f = (a) => { return a * 2; };",
    ));
    suite.add_test(TestCase::should_succeed("no_params", "var f = () => 42;"));

    // Parenthesized expressions must still parse after the rewind
    suite.add_test(TestCase::should_succeed(
        "parenthesized_initializer",
        "var x = (1 + 2) * 3;",
    ));
    suite.add_test(TestCase::should_succeed(
        "nested_parens",
        "var x = ((1 + 2));",
    ));

    suite.add_test(TestCase::should_fail(
        "arrow_bad_params",
        "var f = (1, 2) => 3;",
    ));
    suite.add_test(TestCase::should_fail("unclosed_paren", "var x = (1 + 2;"));

    suite
}

fn create_control_flow_tests() -> TestSuite {
    let mut suite = TestSuite::new("Control Flow");

    suite.add_test(TestCase::should_succeed(
        "valid_if",
        "if (x > 1) { x = 2; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "if_else",
        "if (x > 1) { x = 2; } else { x = 0; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "else_if_chain",
        "if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "valid_while",
        "while (x < 3) { x = x + 1; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "traditional_for",
        "for (var i = 0; i < 10; i++) { console.log(i); }",
    ));
    suite.add_test(TestCase::should_succeed(
        "for_of",
        "for (var item of arr) { console.log(item); }",
    ));
    suite.add_test(TestCase::should_succeed(
        "for_in",
        "for (key in obj) { console.log(key); }",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "if_missing_condition",
        "if { x = 1; }",
        "Expected '('",
    ));
    suite.add_test(TestCase::should_fail("if_missing_body", "if (x > 1)"));
    suite.add_test(TestCase::should_fail(
        "while_missing_condition",
        "while { x = 1; }",
    ));
    suite.add_test(TestCase::should_fail(
        "for_missing_semicolon",
        "for (var i = 0 i < 10; i++) { }",
    ));

    suite
}

fn create_function_tests() -> TestSuite {
    let mut suite = TestSuite::new("Functions and Calls");

    suite.add_test(TestCase::should_succeed(
        "declaration",
        "function add(a, b) { return a + b; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "empty_body",
        "function noop() {}",
    ));
    suite.add_test(TestCase::should_succeed(
        "bare_return",
        "function f() { return; }",
    ));
    suite.add_test(TestCase::should_succeed("call_statement", "foo(1, 2, 3);"));
    suite.add_test(TestCase::should_succeed(
        "method_call",
        "arr.push(4);",
    ));
    suite.add_test(TestCase::should_succeed(
        "chained_access",
        "var c = obj.items[0].name;",
    ));

    suite.add_test(TestCase::should_fail(
        "missing_closing_paren",
        "foo(1, 2;",
    ));
    suite.add_test(TestCase::should_fail("trailing_comma", "foo(1, 2,);"));
    suite.add_test(TestCase::should_fail_with_message(
        "missing_function_name",
        "function (a) { return a; }",
        "Expected function name",
    ));

    suite
}

fn create_class_tests() -> TestSuite {
    let mut suite = TestSuite::new("Classes");

    suite.add_test(TestCase::should_succeed(
        "constructor_and_method",
        "class Pessoa { constructor(nome) { this.nome = nome; } apresentar() { return this.nome; } }",
    ));
    suite.add_test(TestCase::should_succeed("empty_class", "class Vazia { }"));
    suite.add_test(TestCase::should_succeed(
        "new_expression",
        "var p = new Pessoa('Ana');",
    ));
    suite.add_test(TestCase::should_succeed(
        "this_assignment",
        "class C { constructor() { this.count = 0; } inc() { this.count++; } }",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "two_constructors",
        "class C { constructor() {} constructor() {} }",
        "already has a constructor",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "stray_token_in_body",
        "class C { 42 }",
        "class body",
    ));
    suite.add_test(TestCase::should_fail(
        "new_missing_args",
        "var p = new Pessoa;",
    ));

    suite
}

fn create_comment_tests() -> TestSuite {
    let mut suite = TestSuite::new("Comments");

    suite.add_test(TestCase::should_succeed("line_comment", "// hello"));
    suite.add_test(TestCase::should_succeed(
        "inline_comment",
        "var x = 1; // note",
    ));
    suite.add_test(TestCase::should_succeed(
        "multiline_comment",
        "/* first\nsecond */",
    ));
    suite.add_test(TestCase::should_succeed(
        "comment_in_class",
        "class C { // about the constructor\n constructor() {} }",
    ));

    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_multiline",
        "/* never closed",
        "Unterminated multiline comment",
    ));

    suite
}

fn create_lexical_tests() -> TestSuite {
    let mut suite = TestSuite::new("Lexical Errors");

    suite.add_test(TestCase::should_fail_with_message(
        "unterminated_string",
        "var s = 'hello;",
        "Unterminated string",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "unknown_character",
        "var x = 1 @ 2;",
        "Unrecognized character '@'",
    ));
    suite.add_test(TestCase::should_fail_with_message(
        "lone_ampersand",
        "var x = a & b;",
        "Unrecognized character '&'",
    ));
    suite.add_test(TestCase::should_succeed(
        "escaped_quote",
        "var s = 'it\\'s';",
    ));
    suite.add_test(TestCase::should_succeed(
        "accented_identifier",
        "var ação = 1;",
    ));

    suite
}

fn create_edge_case_tests() -> TestSuite {
    let mut suite = TestSuite::new("Edge Cases");

    suite.add_test(TestCase::should_succeed("empty_input", ""));
    suite.add_test(TestCase::should_succeed("only_whitespace", "   \n\t  "));
    suite.add_test(TestCase::should_fail(
        "unexpected_eof_in_expression",
        "var x = 1 +",
    ));
    suite.add_test(TestCase::should_fail(
        "statement_starting_with_number",
        "42;",
    ));
    suite.add_test(TestCase::should_succeed(
        "deeply_nested_condition",
        "if ((((x)))) { x = 1; }",
    ));
    suite.add_test(TestCase::should_succeed(
        "update_statements",
        "i++; j--; k += 2; l -= 3;",
    ));

    suite
}

#[test]
fn comprehensive_parser_tests() {
    let mut all_passed = true;

    let suites = vec![
        create_declaration_tests(),
        create_arrow_function_tests(),
        create_control_flow_tests(),
        create_function_tests(),
        create_class_tests(),
        create_comment_tests(),
        create_lexical_tests(),
        create_edge_case_tests(),
    ];

    for suite in suites {
        let results = suite.run();
        if !results.is_all_passed() {
            all_passed = false;
        }
    }

    assert!(all_passed, "some parser robustness tests failed");
}

#[test]
fn lexical_errors_carry_line_column_and_source_line() {
    let err = parse_input("var x = 1;\nvar y = 2 @ 3;").expect_err("expected a lexical error");
    assert!(err.message.contains("line 2"), "message: {}", err.message);
    assert!(err.message.contains("column 11"), "message: {}", err.message);
    assert!(
        err.message.contains("var y = 2 @ 3;"),
        "message: {}",
        err.message
    );
}

#[test]
fn var_declaration_shape() {
    let program = parse_input("var x = 10;").unwrap();
    assert_eq!(program.statements.len(), 1);

    match &program.statements[0] {
        js2py::ast::Stmt::VarDecl { name, init, .. } => {
            assert_eq!(name, "x");
            match init {
                js2py::ast::Expr::Literal {
                    value: js2py::ast::Literal::Number(n),
                } => assert_eq!(*n, 10.0),
                other => panic!("expected numeric literal initializer, got {:?}", other),
            }
        }
        other => panic!("expected variable declaration, got {:?}", other),
    }
}

#[test]
fn retokenizing_lexemes_preserves_kinds() {
    let source = "var x = 1 + 2 * 3; if (x >= 7) { console.log('ok'); }";

    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens().unwrap();

    // Strings lose their quotes in the lexeme, so skip inputs with strings
    // when rebuilding; here we rebuild only the non-literal prefix.
    let rebuilt: Vec<String> = tokens
        .iter()
        .take_while(|t| t.kind != js2py::lexer::TokenKind::Str)
        .filter(|t| t.kind != js2py::lexer::TokenKind::Eof)
        .map(|t| t.lexeme.clone())
        .collect();
    let rebuilt = rebuilt.join(" ");

    let mut relexer = Lexer::new(rebuilt);
    let retokens = relexer.scan_tokens().unwrap();

    let kinds: Vec<_> = tokens
        .iter()
        .take_while(|t| t.kind != js2py::lexer::TokenKind::Str)
        .map(|t| t.kind.clone())
        .collect();
    let rekinds: Vec<_> = retokens
        .iter()
        .take(kinds.len())
        .map(|t| t.kind.clone())
        .collect();

    assert_eq!(kinds, rekinds);
}
