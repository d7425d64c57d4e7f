//! `blitzcoder tools`: list the built-in tools.

use blitzcoder_tools::BuiltinTool;

use super::runtime;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = runtime::load_config()?;

    println!("Built-in tools");
    println!("==============");
    for tool in BuiltinTool::all() {
        let mark = if tool.enabled(&config.tools) { "on " } else { "off" };
        println!("  [{mark}] {}", tool.name());
    }
    println!();
    println!("  Process tools are switched with tools.shell, tools.python_exec and tools.dev_server.");
    Ok(())
}
