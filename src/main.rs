use clap::Parser;
use elle_ioc::ioc::{analyze, lower};
use elle_ioc::{
    compile, read_syntax, read_syntax_all, step, CompileOptions, Host, Span, Step, Syntax, Value,
};
use std::{fs, process};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Source file; its forms run in order as one machine
    #[arg(help = "The .lisp file to compile and run")]
    file: String,

    /// Treat `(yield x)` as a suspension point
    #[arg(long = "yield", help = "Compile yield calls as suspensions")]
    generator: bool,

    /// Parameter values, bound to arg0, arg1, ...
    #[arg(long = "arg", value_name = "VALUE")]
    args: Vec<String>,

    /// Values fed back to successive suspensions
    #[arg(long = "resume", value_name = "VALUE")]
    resumes: Vec<String>,

    /// Print the lowered blocks and the slot layout instead of running
    #[arg(long, help = "Dump lowered blocks and slot assignments")]
    dump: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(message) = run(&cli) {
        eprintln!("{}", message);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let source = fs::read_to_string(&cli.file)
        .map_err(|err| format!("Error reading file '{}': {}", cli.file, err))?;
    let forms = read_syntax_all(&source).map_err(|err| format!("Parse error: {}", err))?;
    let mut items = vec![Syntax::symbol("do", Span::synthetic())];
    items.extend(forms);
    let program = Syntax::list(items, Span::synthetic());

    let mut options = CompileOptions::new().with_name(&cli.file);
    for i in 0..cli.args.len() {
        options = options.with_param(&format!("arg{}", i));
    }
    if cli.generator {
        options = options.with_terminator("yield", "yield");
    }

    if cli.dump {
        let machine = lower(&program, &options).map_err(|err| err.to_string())?;
        let layout = analyze(&machine);
        print!("{}", machine);
        println!("== slots ==");
        for (id, slot) in &layout.slots {
            println!("{} -> {}", id, slot);
        }
        return Ok(());
    }

    let host = Host::with_primitives();
    let machine = compile(&program, &options, &host).map_err(|err| err.to_string())?;
    let args = cli
        .args
        .iter()
        .map(|s| parse_value(s))
        .collect::<Result<Vec<_>, _>>()?;
    let state = machine.create_with(&args).map_err(|f| f.to_string())?;

    let mut resumes = cli.resumes.iter();
    loop {
        match step(&state).map_err(|f| format!("Runtime error: {}", f))? {
            Step::Done(value) => {
                println!("{:?}", value);
                return Ok(());
            }
            Step::Suspended => {
                println!("yield: {:?}", state.borrow().value());
                match resumes.next() {
                    Some(text) => {
                        let value = parse_value(text)?;
                        state.borrow_mut().set_value(value);
                    }
                    None => {
                        println!("suspended");
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn parse_value(text: &str) -> Result<Value, String> {
    read_syntax(text)
        .map(|syntax| Value::from_syntax(&syntax))
        .map_err(|err| format!("Bad value '{}': {}", text, err))
}
