use anyhow::{Context, Result, ensure};
use std::path::Path;

use mercu::{CapturedConsole, Config, Error, Interpreter, run_source};
use test_support::{Case, CaseClass, load_cases, normalize_output};

fn interpreter() -> Interpreter {
    // Port 0 keeps cases that start the API from colliding with each other.
    Interpreter::new(Config::default().with_api_addr(([127, 0, 0, 1], 0).into()).with_color(false))
}

fn run_case(case: &Case) -> Result<(std::result::Result<(), Error>, String)> {
    let source = case.source()?;
    let mut console = CapturedConsole::new();
    let result = run_source(&source, &interpreter(), &mut console).map(|mut context| {
        if let Err(error) = context.shutdown_service() {
            eprintln!("{}: failed to stop API service: {error}", case.name);
        }
    });
    Ok((result, console.output()))
}

fn check_error(case: &Case, result: std::result::Result<(), Error>) -> Result<()> {
    let Err(error) = result else {
        anyhow::bail!("Expected {:?} in {}, but the program ran", case.spec.class, case.name);
    };
    let expected = &case.spec.expected;
    let stage_matches = match case.spec.class {
        CaseClass::FrontendError => matches!(error, Error::Parse(_)),
        CaseClass::RuntimeError => matches!(error, Error::Eval(_)),
        CaseClass::RuntimeSuccess => false,
    };
    ensure!(
        stage_matches,
        "Case {} failed in the wrong stage: {error}",
        case.name
    );
    if let Some(kind) = expected.error_kind.as_deref() {
        ensure!(
            error.kind().name() == kind,
            "Case {} expected a {kind} error, got {} ({error})",
            case.name,
            error.kind()
        );
    }
    if let Some(fragment) = expected.error_contains.as_deref() {
        let actual = error.to_string();
        ensure!(
            actual.contains(fragment),
            "Expected error containing '{fragment}' in {}, got '{actual}'",
            case.name
        );
    }
    Ok(())
}

#[test]
fn runs_program_cases() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;

    for case in &cases {
        let (result, output) = run_case(case)?;
        match case.spec.class {
            CaseClass::RuntimeSuccess => {
                result.with_context(|| format!("Running {}", case.name))?;
                let stdout_file = case
                    .spec
                    .expected
                    .stdout_file
                    .as_deref()
                    .with_context(|| format!("Missing stdout_file in {}", case.name))?;
                let expected = case.read_text(stdout_file)?;
                assert_eq!(
                    normalize_output(&output),
                    normalize_output(&expected),
                    "Output mismatch for {}",
                    case.name
                );
            }
            CaseClass::FrontendError | CaseClass::RuntimeError => {
                check_error(case, result)?;
                if let Some(stdout_file) = case.spec.expected.stdout_file.as_deref() {
                    let expected = case.read_text(stdout_file)?;
                    assert_eq!(
                        normalize_output(&output),
                        normalize_output(&expected),
                        "Output before the error differs for {}",
                        case.name
                    );
                }
            }
        }
    }

    Ok(())
}

#[test]
fn tokens_re_render_every_case_source() -> Result<()> {
    for case in load_cases(Path::new("tests/programs"))? {
        if case.spec.class == CaseClass::FrontendError {
            continue;
        }
        let source = case.source()?;
        let tokens = mercu::lexer::tokenize(&source)
            .with_context(|| format!("Tokenizing {}", case.name))?;
        let rendered: String = tokens.iter().map(|token| token.lexeme(&source)).collect();
        let significant: String = source.chars().filter(|c| !c.is_whitespace()).collect();
        let rendered: String = rendered.chars().filter(|c| !c.is_whitespace()).collect();
        ensure!(rendered == significant, "Token spans lose text in {}", case.name);
    }
    Ok(())
}
