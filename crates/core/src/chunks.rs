//! Newline-preserving line splitting and joining.
//!
//! Merge input and output is passed around as *chunks*: lines that keep
//! their trailing `\n` (the final chunk of a file without a trailing
//! newline keeps none). Keeping the line endings inside the chunks makes
//! reassembly a plain concatenation, so `join_chunks(split_chunks(s)) == s`
//! holds for every input.

/// Split `text` into chunks, each retaining its trailing newline.
pub fn split_chunks(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Concatenate chunks back into a flat string.
pub fn join_chunks<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks.iter().map(|c| c.as_ref()).collect()
}
