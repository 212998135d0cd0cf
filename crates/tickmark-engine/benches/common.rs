// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_todo_list(items: usize) -> String {
    let mut content = String::from("# Backlog\n\n");
    for i in 0..items {
        let marker = if i % 3 == 0 { "✔" } else { "□" };
        let indent = "  ".repeat(i % 4);
        content.push_str(&format!(
            "{indent}- {marker} Task {i} @priority(p{}) @due(2024-01-{:02})\n",
            i % 3,
            i % 28 + 1
        ));
        if i % 10 == 0 {
            content.push_str(&format!("{indent}  notes for task {i}\n"));
        }
    }
    content
}

/// One root with `children` direct children, each with `grandchildren`.
#[allow(dead_code)]
pub fn generate_wide_tree(children: usize, grandchildren: usize) -> String {
    let mut content = String::from("- □ Root\n");
    for c in 0..children {
        content.push_str(&format!("  - □ Child {c}\n"));
        for g in 0..grandchildren {
            content.push_str(&format!("    - □ Grandchild {c}.{g}\n"));
        }
    }
    content
}
