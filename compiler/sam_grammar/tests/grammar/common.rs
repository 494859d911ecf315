//! Shared helpers.

use sam_ir::{Language, Tree};

/// A program touching every construct of the language.
pub const SAMPLE: &str = r#"interface "std/io" load io;
interface 'lib\x41' load lib;

// arithmetic
let a = 1, b = 0x1F, c = 1.5e-3, d;
let grid[0] = 2;
total = a + b * c ** 2 - -a;
let add = (x, y) => x + y;
let fact = (n) => {
  if (n <= 1) { return 1; } else { return n * fact(n - 1); };
};
for item in [1, 2, 3] { io.print(item); };
grid[1];
[1, 2][0];
"say \"hi\"\n";
!done;
return;
"#;

pub fn sam() -> Language {
    sam_grammar::language().unwrap()
}

pub fn parse(text: &str) -> Tree {
    sam_parse::parse(&sam(), text, None, &[])
}

/// Concatenated leaf text equals the input.
pub fn assert_covers(tree: &Tree, text: &str) {
    let covered: String = tree.leaves().map(|leaf| &text[leaf.byte_range()]).collect();
    assert_eq!(covered, text);
}
