// Generate the procflow man page
//
// Usage: generate-man [OUTPUT_DIR]   (defaults to ./man)

use clap::CommandFactory;
use procflow::cli::Cli;
use std::path::PathBuf;

fn main() -> std::io::Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd.clone());
    let mut buffer: Vec<u8> = Vec::new();
    man.render(&mut buffer)?;
    let page = out_dir.join("procflow.1");
    std::fs::write(&page, buffer)?;
    println!("Wrote {}", page.display());

    for sub in cmd.get_subcommands() {
        let name = format!("procflow-{}", sub.get_name());
        let man = clap_mangen::Man::new(sub.clone());
        let mut buffer: Vec<u8> = Vec::new();
        man.render(&mut buffer)?;
        let page = out_dir.join(format!("{}.1", name));
        std::fs::write(&page, buffer)?;
        println!("Wrote {}", page.display());
    }
    Ok(())
}
