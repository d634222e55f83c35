//! karst-drv - Embedding API and Driver
//!
//! [`Session`] is the host-facing surface of the interpreter: one machine
//! with the builtin primitives installed, plus the read / expand / eval /
//! collect entry points errors unwind to. Hosts that want more than script
//! evaluation reach through to the [`Machine`] for constructors, accessors
//! and primitive registration.
//!
//! The `karst` binary is a thin front end over a session: it evaluates
//! script files given as arguments, a `-e` expression, or runs a
//! line-oriented REPL on stdin. Garbage is collected between top-level
//! evaluations; user errors print through the error table and never abort
//! the process.
//!
//! ## Embedding example
//!
//! ```
//! use karst_drv::Session;
//! use kgc::Value;
//!
//! let mut session = Session::new().unwrap();
//! let v = session.eval_source("(+ 1 2 3)").unwrap();
//! assert_eq!(v, Value::Int(6));
//!
//! // Host-registered primitives sit next to the builtins.
//! session
//!     .machine_mut()
//!     .define_primitive("always-seven", |_m, _args| Ok(Value::Int(7)));
//! assert_eq!(session.eval_source("(always-seven)").unwrap(), Value::Int(7));
//! ```

use std::io::{BufRead, Write};
use std::path::Path;

use anyhow::anyhow;
use karst_util::Result;
use kgc::{print_value, Machine, MachineConfig, Value};

/// One interpreter instance with the builtin primitives installed.
pub struct Session {
    machine: Machine,
}

impl Session {
    /// Creates a session with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Result<Self> {
        let mut machine = Machine::new(config)?;
        karst_eval::prims::install(&mut machine);
        Ok(Self { machine })
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    /// Reads a source string to a value (several top-level expressions read
    /// as one `begin` form).
    pub fn read(&mut self, source: &str) -> Result<Value> {
        karst_read::read_str(&mut self.machine, source)
    }

    /// Reads a file to a value without evaluating it.
    pub fn read_path(&mut self, path: &Path) -> Result<Value> {
        karst_read::read_path(&mut self.machine, path)
    }

    /// Lowers surface forms to the primitive language.
    pub fn expand(&mut self, v: Value) -> Result<Value> {
        karst_expand::expand(&mut self.machine, v)
    }

    /// Evaluates a value in the global environment.
    pub fn eval(&mut self, v: Value) -> Result<Value> {
        let globals = self.machine.globals();
        karst_eval::eval(&mut self.machine, v, globals)
    }

    /// Evaluates a value in a caller-supplied environment.
    pub fn eval_in(&mut self, v: Value, env: Value) -> Result<Value> {
        karst_eval::eval(&mut self.machine, v, env)
    }

    /// The full pipeline: read, expand, evaluate.
    pub fn eval_source(&mut self, source: &str) -> Result<Value> {
        let v = self.read(source)?;
        let v = self.expand(v)?;
        self.eval(v)
    }

    /// Reads, expands and evaluates a script file.
    pub fn load_path(&mut self, path: &Path) -> Result<Value> {
        let v = self.read_path(path)?;
        let v = self.expand(v)?;
        self.eval(v)
    }

    /// Collects garbage, returning the relocated `root`. Every other value
    /// previously handed out by this session is invalidated.
    pub fn collect(&mut self, root: Value) -> Value {
        self.machine.collect(root)
    }

    /// The global environment, for `eval_in` and host-side bindings.
    pub fn global_env(&self) -> Value {
        self.machine.globals()
    }

    /// Renders a value in readable form.
    pub fn print(&self, v: Value) -> String {
        print_value(self.machine.heap(), v)
    }
}

const USAGE: &str = "\
Usage: karst [options] [file...]

Evaluates Karst script files in order, or reads expressions from stdin
when no file is given.

Options:
  -e <expr>     evaluate <expr> and print the result
  -h, --help    show this help
  -V, --version show the version
";

/// Entry point for the `karst` binary.
pub fn run() -> anyhow::Result<()> {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut files = Vec::new();
    let mut exprs = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print!("{USAGE}");
                return Ok(());
            }
            "-V" | "--version" => {
                println!("karst {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "-e" => {
                i += 1;
                let expr = args
                    .get(i)
                    .ok_or_else(|| anyhow!("-e expects an expression"))?;
                exprs.push(expr.clone());
            }
            flag if flag.starts_with('-') => {
                return Err(anyhow!("unknown option '{flag}'\n{USAGE}"));
            }
            file => files.push(file.to_string()),
        }
        i += 1;
    }

    let mut session = Session::new()?;

    for file in &files {
        let path = Path::new(file);
        session
            .load_path(path)
            .map_err(|e| anyhow!("{}: {}", path.display(), e))?;
        session.collect(Value::Null);
    }

    for expr in &exprs {
        let v = session.eval_source(expr).map_err(|e| anyhow!("{e}"))?;
        println!("{}", session.print(v));
        session.collect(Value::Null);
    }

    if files.is_empty() && exprs.is_empty() {
        repl(&mut session)?;
    }
    Ok(())
}

/// Line-oriented REPL: one top-level unit per line, collection between
/// lines, user errors reported without leaving the loop.
fn repl(session: &mut Session) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let interactive = is_terminal(&stdin);

    if interactive {
        println!("karst {}", env!("CARGO_PKG_VERSION"));
    }
    let mut line = String::new();
    loop {
        if interactive {
            print!("> ");
            stdout.flush()?;
        }
        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let source = line.trim();
        if source.is_empty() {
            continue;
        }
        match session.eval_source(source) {
            Ok(v) => println!("{}", session.print(v)),
            Err(e) => eprintln!("error: {e}"),
        }
        session.collect(Value::Null);
    }
    Ok(())
}

fn is_terminal(stdin: &std::io::Stdin) -> bool {
    use std::io::IsTerminal;
    stdin.is_terminal()
}
