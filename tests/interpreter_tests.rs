// Interpreter semantics tests: programs run against a fresh environment
// and the final bindings are inspected through `Interpreter::env_get`.

use js2py::error::{Error, ErrorKind};
use js2py::interpreter::Interpreter;
use js2py::lexer::Lexer;
use js2py::parser::Parser;
use js2py::value::Value;

fn run(source: &str) -> Interpreter {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens().expect("lexing failed");
    let mut parser = Parser::new(tokens);
    let program = parser.parse().expect("parsing failed");

    let mut interpreter = Interpreter::new();
    interpreter.run(&program).expect("execution failed");
    interpreter
}

fn run_err(source: &str) -> Error {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = lexer.scan_tokens().expect("lexing failed");
    let mut parser = Parser::new(tokens);
    let program = parser.parse().expect("parsing failed");

    let mut interpreter = Interpreter::new();
    interpreter
        .run(&program)
        .expect_err("expected execution to fail")
}

fn number(interpreter: &Interpreter, name: &str) -> f64 {
    match interpreter.env_get(name) {
        Some(Value::Number(n)) => n,
        other => panic!("expected '{}' to be a number, got {:?}", name, other),
    }
}

fn string(interpreter: &Interpreter, name: &str) -> String {
    match interpreter.env_get(name) {
        Some(Value::Str(s)) => s,
        other => panic!("expected '{}' to be a string, got {:?}", name, other),
    }
}

#[test]
fn empty_console_log_prints_a_blank_line() {
    // no arguments is valid and emits one empty line, matching print()
    run("console.log();");
}

#[test]
fn if_else_takes_the_true_branch() {
    let interp = run("var x = 5; if (x > 3) { x = 20; } else { x = 0; }");
    assert_eq!(number(&interp, "x"), 20.0);
}

#[test]
fn while_loop_counts_to_three() {
    let interp = run("var x = 0; while (x < 3) { x = x + 1; }");
    assert_eq!(number(&interp, "x"), 3.0);
}

#[test]
fn traditional_for_accumulates() {
    let interp = run("var sum = 0; for (var i = 0; i < 5; i++) { sum += i; }");
    assert_eq!(number(&interp, "sum"), 10.0);
    assert_eq!(number(&interp, "i"), 5.0);
}

#[test]
fn length_increment_appends_null() {
    let interp = run("var arr = [1, 2]; arr.length++;");
    match interp.env_get("arr") {
        Some(Value::List(list)) => {
            let list = list.borrow();
            assert_eq!(list.len(), 3);
            assert!(matches!(list[2], Value::Null));
        }
        other => panic!("expected a list, got {:?}", other),
    }
}

#[test]
fn length_decrement_truncates() {
    let interp = run("var arr = [1, 2, 3]; arr.length--; var n = arr.length;");
    assert_eq!(number(&interp, "n"), 2.0);
}

#[test]
fn undefined_variable_is_a_name_error() {
    let err = run_err("console.log(x);");
    assert_eq!(err.kind, ErrorKind::Name);
    assert!(err.message.contains("'x'"));
}

#[test]
fn null_is_not_a_keyword() {
    // `null` resolves like any other identifier
    let err = run_err("var x = null;");
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn update_expressions_are_positional() {
    let interp = run("var i = 1; var a = i++; var b = ++i;");
    assert_eq!(number(&interp, "a"), 1.0);
    assert_eq!(number(&interp, "b"), 3.0);
    assert_eq!(number(&interp, "i"), 3.0);
}

#[test]
fn closures_capture_a_snapshot() {
    let interp = run("var x = 1; function f() { return x; } x = 2; var y = f();");
    assert_eq!(number(&interp, "y"), 1.0);
    assert_eq!(number(&interp, "x"), 2.0);
}

#[test]
fn recursive_calls_see_the_callee() {
    let interp = run(
        "function fatorial(n) { if (n <= 1) { return 1; } return n * fatorial(n - 1); } \
         var r = fatorial(5);",
    );
    assert_eq!(number(&interp, "r"), 120.0);
}

#[test]
fn missing_arguments_bind_null_and_extras_are_ignored() {
    let interp = run(
        "function f(a, b) { if (!b) { return a; } return b; } \
         var m = f(7); var e = f(1, 2, 3);",
    );
    assert_eq!(number(&interp, "m"), 7.0);
    assert_eq!(number(&interp, "e"), 2.0);
}

#[test]
fn lambda_evaluates_its_expression() {
    let interp = run("var dobro = (n) => n * 2; var r = dobro(21);");
    assert_eq!(number(&interp, "r"), 42.0);
}

#[test]
fn block_bodied_arrow_behaves_like_a_function() {
    let interp = run("var f = (a, b) => { return a + b; }; var r = f(2, 3);");
    assert_eq!(number(&interp, "r"), 5.0);
}

#[test]
fn division_by_zero_follows_float_semantics() {
    let interp = run("var p = 1 / 0; var n = -1 / 0; var z = 0 / 0;");
    assert_eq!(number(&interp, "p"), f64::INFINITY);
    assert_eq!(number(&interp, "n"), f64::NEG_INFINITY);
    assert!(number(&interp, "z").is_nan());
}

#[test]
fn plus_concatenates_when_either_side_is_a_string() {
    let interp = run("var s = 'total: ' + 42; var t = 1 + '2';");
    assert_eq!(string(&interp, "s"), "total: 42");
    assert_eq!(string(&interp, "t"), "12");
}

#[test]
fn strict_equality_collapses_to_value_equality() {
    let interp = run("var a = 1 === 1; var b = 'x' !== 'x'; var c = 2 == 2;");
    assert!(matches!(interp.env_get("a"), Some(Value::Bool(true))));
    assert!(matches!(interp.env_get("b"), Some(Value::Bool(false))));
    assert!(matches!(interp.env_get("c"), Some(Value::Bool(true))));
}

#[test]
fn logical_operators_short_circuit_to_operands() {
    // the right side of && is never evaluated, so `undefined` is fine there
    let interp = run("var a = 0 || 'fallback'; var b = false && undefined;");
    assert_eq!(string(&interp, "a"), "fallback");
    assert!(matches!(interp.env_get("b"), Some(Value::Bool(false))));
}

#[test]
fn for_each_restores_a_shadowed_loop_variable() {
    let interp = run("var x = 99; var arr = [1, 2, 3]; var sum = 0; \
                      for (var x of arr) { sum = sum + x; }");
    assert_eq!(number(&interp, "sum"), 6.0);
    assert_eq!(number(&interp, "x"), 99.0);
}

#[test]
fn for_in_iterates_object_keys() {
    let interp = run(
        "var obj = {a: 1, b: 2}; var keys = ''; for (var k in obj) { keys = keys + k; }",
    );
    assert_eq!(string(&interp, "keys"), "ab");
}

#[test]
fn classes_construct_and_dispatch() {
    let interp = run(
        "class Pessoa { \
           constructor(nome) { this.nome = nome; } \
           saudacao() { return 'Olá, ' + this.nome; } \
         } \
         var p = new Pessoa('Ana'); \
         var s = p.saudacao(); \
         var nome = p.nome;",
    );
    assert_eq!(string(&interp, "s"), "Olá, Ana");
    assert_eq!(string(&interp, "nome"), "Ana");
}

#[test]
fn constructor_return_value_is_discarded() {
    let interp = run("class C { constructor() { return 5; } } var c = new C();");
    assert!(matches!(interp.env_get("c"), Some(Value::Instance(_))));
}

#[test]
fn methods_mutate_shared_instance_state() {
    let interp = run(
        "class Contador { \
           constructor() { this.total = 0; } \
           inc() { this.total++; } \
         } \
         var c = new Contador(); c.inc(); c.inc(); \
         var total = c.total;",
    );
    assert_eq!(number(&interp, "total"), 2.0);
}

#[test]
fn unknown_method_on_class_is_an_attribute_error() {
    let err = run_err("class C { } var c = new C(); c.faz();");
    assert_eq!(err.kind, ErrorKind::Attribute);
    assert!(err.message.contains("'faz'"));
}

#[test]
fn this_outside_a_method_is_a_name_error() {
    let err = run_err("var t = this;");
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn calling_a_non_function_is_a_type_error() {
    let err = run_err("var x = 1; x();");
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn new_on_undefined_class_is_a_name_error() {
    let err = run_err("var p = new Fantasma();");
    assert_eq!(err.kind, ErrorKind::Name);
}

#[test]
fn string_methods() {
    let interp = run(
        "var s = 'JavaScript'; \
         var c = s.charAt(0); \
         var fora = s.charAt(99); \
         var sub = s.substr(0, 4); \
         var sub2 = s.substring(4, 10); \
         var up = s.toUpperCase(); \
         var n = s.length;",
    );
    assert_eq!(string(&interp, "c"), "J");
    assert_eq!(string(&interp, "fora"), "");
    assert_eq!(string(&interp, "sub"), "Java");
    assert_eq!(string(&interp, "sub2"), "Script");
    assert_eq!(string(&interp, "up"), "JAVASCRIPT");
    assert_eq!(number(&interp, "n"), 10.0);
}

#[test]
fn char_at_arity_is_a_type_error() {
    let err = run_err("var s = 'x'; s.charAt();");
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn unknown_string_method_is_an_attribute_error() {
    let err = run_err("var s = 'x'; s.explode();");
    assert_eq!(err.kind, ErrorKind::Attribute);
}

#[test]
fn array_methods() {
    let interp = run(
        "var arr = [1, 2]; \
         var len = arr.push(3, 4); \
         var last = arr.pop(); \
         var empty = []; \
         var nada = empty.pop();",
    );
    assert_eq!(number(&interp, "len"), 4.0);
    assert_eq!(number(&interp, "last"), 4.0);
    assert!(matches!(interp.env_get("nada"), Some(Value::Null)));
}

#[test]
fn number_methods() {
    let interp = run("var pi = 3.14159; var fixed = pi.toFixed(2); var s = (42).toString();");
    assert_eq!(string(&interp, "fixed"), "3.14");
    assert_eq!(string(&interp, "s"), "42");
}

#[test]
fn math_namespace() {
    let interp = run(
        "var f = Math.floor(3.7); \
         var c = Math.ceil(3.2); \
         var p = Math.pow(2, 10); \
         var m = Math.max(1, 5, 3); \
         var pi = Math.PI;",
    );
    assert_eq!(number(&interp, "f"), 3.0);
    assert_eq!(number(&interp, "c"), 4.0);
    assert_eq!(number(&interp, "p"), 1024.0);
    assert_eq!(number(&interp, "m"), 5.0);
    assert!((number(&interp, "pi") - std::f64::consts::PI).abs() < 1e-12);
}

#[test]
fn math_random_is_in_unit_range() {
    let interp = run("var r = Math.random();");
    let r = number(&interp, "r");
    assert!((0.0..1.0).contains(&r));
}

#[test]
fn unknown_math_member_is_an_attribute_error() {
    let err = run_err("var x = Math.cbrt(8);");
    assert_eq!(err.kind, ErrorKind::Attribute);
}

#[test]
fn math_arity_is_a_type_error() {
    let err = run_err("var x = Math.pow(2);");
    assert_eq!(err.kind, ErrorKind::Type);
}

#[test]
fn user_binding_shadows_math() {
    let interp = run("var Math = {floor: 1}; var x = Math.floor;");
    assert_eq!(number(&interp, "x"), 1.0);
}

#[test]
fn object_literal_access_and_missing_keys() {
    let interp = run(
        "var o = {a: 1}; var v = o.a; var w = o['a']; var falta = o.b; o.c = 3; var c = o.c;",
    );
    assert_eq!(number(&interp, "v"), 1.0);
    assert_eq!(number(&interp, "w"), 1.0);
    assert!(matches!(interp.env_get("falta"), Some(Value::Null)));
    assert_eq!(number(&interp, "c"), 3.0);
}

#[test]
fn index_assignment_and_out_of_range_reads() {
    let interp = run("var arr = [1, 2, 3]; arr[1] = 20; var v = arr[1]; var fora = arr[9];");
    assert_eq!(number(&interp, "v"), 20.0);
    assert!(matches!(interp.env_get("fora"), Some(Value::Null)));
}

#[test]
fn lists_are_shared_across_environment_copies() {
    // the closure saw a snapshot of bindings, but the list payload is shared
    let interp = run(
        "var arr = [1]; function f() { arr.push(2); } f(); var n = arr.length;",
    );
    assert_eq!(number(&interp, "n"), 2.0);
}

#[test]
fn compound_assignment_operators() {
    let interp = run("var x = 10; x += 5; x -= 3; var s = 'a'; s += 'b';");
    assert_eq!(number(&interp, "x"), 12.0);
    assert_eq!(string(&interp, "s"), "ab");
}

#[test]
fn truthiness_of_falsy_values() {
    let interp = run(
        "var a = !''; var b = !0; var c = !false; var d = !'x'; var e = !(0 / 0);",
    );
    assert!(matches!(interp.env_get("a"), Some(Value::Bool(true))));
    assert!(matches!(interp.env_get("b"), Some(Value::Bool(true))));
    assert!(matches!(interp.env_get("c"), Some(Value::Bool(true))));
    assert!(matches!(interp.env_get("d"), Some(Value::Bool(false))));
    assert!(matches!(interp.env_get("e"), Some(Value::Bool(true))));
}

#[test]
fn return_unwinds_nested_loops() {
    let interp = run(
        "function primeiro(arr) { \
           for (var x of arr) { \
             if (x > 1) { return x; } \
           } \
           return 0; \
         } \
         var r = primeiro([1, 2, 3]);",
    );
    assert_eq!(number(&interp, "r"), 2.0);
}

#[test]
fn instance_display_uses_class_name() {
    let interp = run("class Ponto { } var p = new Ponto();");
    let p = interp.env_get("p").unwrap();
    assert_eq!(format!("{}", p), "[object Ponto]");
}

#[test]
fn number_formatting_drops_integral_fractions() {
    let interp = run("var a = 4 / 2; var s = a.toString();");
    assert_eq!(string(&interp, "s"), "2");
}
