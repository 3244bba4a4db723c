//! Printers: execution outputs as text, with markdown rendered through termimad.

use owo_colors::OwoColorize;
use termimad::MadSkin;

use jupyter_server_api::{ExecutionResult, Kernel, OutputRecord};

pub struct TextPrinter {
    pub color: bool,
}

impl TextPrinter {
    pub fn print_result(&self, result: &ExecutionResult, outputs: &[OutputRecord]) {
        for output in outputs {
            self.print_output(output);
        }
        let count = result
            .execution_count
            .map(|c| c.to_string())
            .unwrap_or_else(|| " ".into());
        let footer = format!("[{}] {}", count, result.status);
        if !self.color {
            eprintln!("{}", footer);
        } else if result.is_ok() {
            eprintln!("{}", footer.green());
        } else {
            eprintln!("{}", footer.red());
        }
    }

    pub fn print_output(&self, output: &OutputRecord) {
        match output {
            OutputRecord::Stream { name, text } if name == "stderr" => {
                if self.color {
                    eprint!("{}", text.yellow());
                } else {
                    eprint!("{}", text);
                }
            }
            OutputRecord::Stream { text, .. } => print!("{}", text),
            OutputRecord::ExecuteResult { execution_count, .. } => {
                if let Some(text) = output.text_plain() {
                    let prompt = format!("Out[{}]:", execution_count.unwrap_or_default());
                    if self.color {
                        println!("{} {}", prompt.magenta(), text);
                    } else {
                        println!("{} {}", prompt, text);
                    }
                }
            }
            OutputRecord::DisplayData { data, .. } => {
                if let Some(md) = output.mime_text("text/markdown") {
                    MarkdownPrinter::default().print(&md);
                } else if let Some(text) = output.text_plain() {
                    println!("{}", text);
                } else {
                    let mimes: Vec<&str> = data.keys().map(|k| k.as_str()).collect();
                    println!("<display_data: {}>", mimes.join(", "));
                }
            }
            OutputRecord::Error { ename, evalue, traceback } => {
                // tracebacks already carry ANSI colors from the kernel
                for line in traceback {
                    eprintln!("{}", line);
                }
                if self.color {
                    eprintln!("{}: {}", ename.red().bold(), evalue);
                } else {
                    eprintln!("{}: {}", ename, evalue);
                }
            }
        }
    }

    pub fn print_kernels(&self, kernels: &[Kernel]) {
        for k in kernels {
            let state = k.execution_state.as_deref().unwrap_or("unknown");
            if self.color {
                println!("{}  {}  {}  connections={}", k.id.cyan(), k.name, state, k.connections);
            } else {
                println!("{}  {}  {}  connections={}", k.id, k.name, state, k.connections);
            }
        }
    }
}

#[derive(Default)]
pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) { self.skin.print_text(text); }
}
