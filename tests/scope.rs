use std::error::Error;

use dungeontalk::interpreter::Value;
use test_utils::run;

#[test]
fn callee_sees_caller_bindings_by_value() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("a = 7\ndef f()\na + 1\nend\nb = exec f()")?;

    assert_eq!(Some(&Value::Int(8)), interpreter.scope().get("b"));
    Ok(())
}

#[test]
fn callee_mutations_do_not_escape() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("a = 1\ndef f()\na = 99\na\nend\nr = exec f()")?;

    assert_eq!(Some(&Value::Int(99)), interpreter.scope().get("r"));
    assert_eq!(Some(&Value::Int(1)), interpreter.scope().get("a"));
    Ok(())
}

#[test]
fn procedure_scope_is_dropped_on_return() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("procedure p()\nlocal = 5\nend\nexec p")?;

    assert_eq!(None, interpreter.scope().get("local"));
    assert_eq!(1, interpreter.memory.scope.len());
    Ok(())
}

#[test]
fn arguments_shadow_caller_bindings() -> Result<(), Box<dyn Error>> {
    let (interpreter, _) = run("x = 1\ndef f(x)\nx * 10\nend\nr = exec f(4)")?;

    assert_eq!(Some(&Value::Int(40)), interpreter.scope().get("r"));
    assert_eq!(Some(&Value::Int(1)), interpreter.scope().get("x"));
    Ok(())
}

#[test]
fn reads_look_only_at_the_innermost_scope() -> Result<(), Box<dyn Error>> {
    // the callee's copy was taken at call time; later caller writes are
    // invisible to it
    let source = "\
a = 1
procedure p()
b = a
end
a = 2
exec p";
    let (interpreter, _) = run(source)?;

    // the copy is taken when the call happens, so the callee saw a = 2,
    // and its own b never escaped
    assert_eq!(None, interpreter.scope().get("b"));
    assert_eq!(Some(&Value::Int(2)), interpreter.scope().get("a"));
    Ok(())
}
