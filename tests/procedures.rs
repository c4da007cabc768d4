use std::error::Error;

use dungeontalk::interpreter::{RuntimeError, Value};
use test_utils::{capturing_interpreter, check_output, Expected};

#[test]
fn procedure_body_runs_on_exec_only() -> Result<(), Box<dyn Error>> {
    check_output(
        "procedure p()\nprnt 9\nend\nexec p",
        Expected { stdout: "9\n" },
    )
}

#[test]
fn declaration_alone_produces_no_output() -> Result<(), Box<dyn Error>> {
    check_output(
        "procedure p()\nprnt 9\nend",
        Expected { stdout: "" },
    )
}

#[test]
fn execution_returns_past_the_call_site() -> Result<(), Box<dyn Error>> {
    let (mut interpreter, sink) = capturing_interpreter();
    interpreter
        .read("procedure p()\nprnt 9\nend\nexec p", false)?;

    // declaration binds the name and skips the body
    interpreter.exec_next()?;
    assert_eq!(3, interpreter.pc());
    assert!(matches!(
        interpreter.scope().get("p"),
        Some(Value::Procedure(_))
    ));

    // the call jumps into the body
    interpreter.exec_next()?;
    assert_eq!(1, interpreter.pc());

    // body prints, end returns
    interpreter.exec_next()?;
    interpreter.exec_next()?;
    assert_eq!(4, interpreter.pc());
    assert_eq!("9\n", sink.contents());

    assert!(matches!(interpreter.exec_next(), Err(RuntimeError::Eof)));
    Ok(())
}

#[test]
fn a_whole_procedure_may_share_one_line() -> Result<(), Box<dyn Error>> {
    check_output(
        "procedure p() prnt 9 end; exec p",
        Expected { stdout: "9\n" },
    )
}

#[test]
fn procedure_with_parameters() -> Result<(), Box<dyn Error>> {
    check_output(
        "procedure greet(who)\nprnt 'Hello ' + who\nend\nexec greet('DM')",
        Expected {
            stdout: "Hello DM\n",
        },
    )
}

#[test]
fn procedures_may_call_procedures() -> Result<(), Box<dyn Error>> {
    let source = "\
procedure inner()
prnt 'inner'
end
procedure outer()
prnt 'outer'
exec inner
end
exec outer";
    check_output(
        source,
        Expected {
            stdout: "outer\ninner\n",
        },
    )
}

#[test]
fn stacks_balance_across_calls() -> Result<(), Box<dyn Error>> {
    let (mut interpreter, _) = capturing_interpreter();
    interpreter.read(
        "procedure p()\nif 1\nprnt 1\nend\nend\nfor i=0; i<2; i++\nexec p\nend",
        false,
    )?;

    loop {
        assert_eq!(
            interpreter.control_stack().len(),
            interpreter.block_stack().len(),
            "stacks diverged at pc {}",
            interpreter.pc()
        );

        match interpreter.exec_next() {
            Ok(_) => {}
            Err(RuntimeError::Eof) => break,
            Err(error) => return Err(Box::new(error)),
        }
    }

    assert_eq!(1, interpreter.control_stack().len());
    assert_eq!(1, interpreter.block_stack().len());
    assert!(interpreter.memory.stack.is_empty());
    assert_eq!(1, interpreter.memory.scope.len());
    Ok(())
}

#[test]
fn procedure_calls_inside_loops_repeat() -> Result<(), Box<dyn Error>> {
    check_output(
        "procedure tick()\nprnt 'tick'\nend\nfor i=0; i<3; i++\nexec tick\nend",
        Expected {
            stdout: "tick\ntick\ntick\n",
        },
    )
}
