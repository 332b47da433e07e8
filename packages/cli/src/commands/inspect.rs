use crate::commands::extract_code;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pagecraft_editor::{decode_document, Document, PlacedComponent};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Share link or bare share code
    pub link: String,

    /// Also print each component's properties
    #[arg(short, long)]
    pub properties: bool,
}

pub fn inspect(args: InspectArgs) -> Result<()> {
    let document = decode_document("cli", &extract_code(&args.link))?;

    println!(
        "📄 {} components",
        document.len().to_string().bright_white().bold()
    );
    print_tree(&document, args.properties);

    Ok(())
}

/// Print the component tree, depth first in sibling order
pub fn print_tree(document: &Document, properties: bool) {
    for root in document.roots() {
        print_node(document, root, 1, properties);
    }
}

fn print_node(document: &Document, component: &PlacedComponent, depth: usize, properties: bool) {
    let indent = "  ".repeat(depth);
    let g = component.geometry;
    println!(
        "{}{} {} {}",
        indent,
        component.component_type.cyan(),
        component.id.dimmed(),
        format!("@{},{} {}x{}", g.x, g.y, g.width, g.height).bright_black()
    );

    if properties {
        for (key, value) in &component.properties {
            println!("{}  {} {}", indent, format!("{key}:").yellow(), value);
        }
    }

    for child in document.children(Some(&component.id)) {
        print_node(document, child, depth + 1, properties);
    }
}
