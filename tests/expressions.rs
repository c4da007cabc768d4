use std::error::Error;

use dungeontalk::interpreter::Value;
use test_utils::run;

#[test]
fn parenthesized_arithmetic() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("z = ((1+3) * 100) / 5")?;

    assert_eq!(Some(&Value::Float(80.0)), interpreter.scope().get("z"));
    Ok(())
}

#[test]
fn right_associative_chains_need_parens_for_precedence() -> Result<(), Box<dyn Error>> {
    // a + (b * c), because the tail binds first
    let (interpreter, _) = run("x = 1 + 2 * 3")?;
    assert_eq!(Some(&Value::Int(7)), interpreter.scope().get("x"));

    // (2 * 3) + 1 only with explicit grouping
    let (interpreter, _) = run("x = (2 * 3) + 1")?;
    assert_eq!(Some(&Value::Int(7)), interpreter.scope().get("x"));

    // without grouping, 2 * (3 + 1)
    let (interpreter, _) = run("x = 2 * 3 + 1")?;
    assert_eq!(Some(&Value::Int(8)), interpreter.scope().get("x"));
    Ok(())
}

#[test]
fn negative_literals_and_subtraction() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("a = -3\nb = 10 - 3\nc = a - -1")?;

    assert_eq!(Some(&Value::Int(-3)), interpreter.scope().get("a"));
    assert_eq!(Some(&Value::Int(7)), interpreter.scope().get("b"));
    assert_eq!(Some(&Value::Int(-2)), interpreter.scope().get("c"));
    Ok(())
}

#[test]
fn string_concatenation() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("who = 'World'\ngreeting = 'Hello ' + who")?;

    assert_eq!(
        Some(&Value::Str("Hello World".into())),
        interpreter.scope().get("greeting")
    );
    Ok(())
}

#[test]
fn logical_words() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) =
        run("a = TRUE AND FALSE\nb = TRUE OR FALSE\nc = TRUE XOR TRUE\nd = NOT FALSE")?;

    assert_eq!(Some(&Value::Bool(false)), interpreter.scope().get("a"));
    assert_eq!(Some(&Value::Bool(true)), interpreter.scope().get("b"));
    assert_eq!(Some(&Value::Bool(false)), interpreter.scope().get("c"));
    assert_eq!(Some(&Value::Bool(true)), interpreter.scope().get("d"));
    Ok(())
}

#[test]
fn comparisons() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("a = 1 == 1.0\nb = 1 === 1.0\nc = 2 > 1\nd = 'abc' < 'abd'")?;

    assert_eq!(Some(&Value::Bool(true)), interpreter.scope().get("a"));
    assert_eq!(Some(&Value::Bool(false)), interpreter.scope().get("b"));
    assert_eq!(Some(&Value::Bool(true)), interpreter.scope().get("c"));
    assert_eq!(Some(&Value::Bool(true)), interpreter.scope().get("d"));
    Ok(())
}

#[test]
fn list_literals() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("l = [1, 'two', 1 + 2]")?;

    assert_eq!(
        Some(&Value::List(vec![
            Value::Int(1),
            Value::Str("two".into()),
            Value::Int(3),
        ])),
        interpreter.scope().get("l")
    );
    Ok(())
}

#[test]
fn division_always_floats() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("a = 10 / 4\nb = 10 / 5")?;

    assert_eq!(Some(&Value::Float(2.5)), interpreter.scope().get("a"));
    assert_eq!(Some(&Value::Float(2.0)), interpreter.scope().get("b"));
    Ok(())
}
