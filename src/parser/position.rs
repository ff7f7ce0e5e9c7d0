/// Offset to line/column conversion for diagnostics
///
/// Lines and columns are 1-based; columns count characters, not bytes.

/// 1-based line containing `offset`
#[must_use]
pub fn line_of(input: &str, offset: usize) -> usize {
    let offset = clamp(input, offset);
    input.as_bytes()[..offset]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

/// 1-based column of `offset` within its line
#[must_use]
pub fn column_of(input: &str, offset: usize) -> usize {
    let offset = clamp(input, offset);
    let line_start = line_start(input, offset);
    input[line_start..offset].chars().count() + 1
}

/// Text of the line containing `offset`, without its newline
#[must_use]
pub fn line_text(input: &str, offset: usize) -> &str {
    let offset = clamp(input, offset);
    let start = line_start(input, offset);
    let end = input[offset..]
        .find('\n')
        .map_or(input.len(), |i| offset + i);
    &input[start..end]
}

fn line_start(input: &str, offset: usize) -> usize {
    input[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Keep `offset` inside the input and on a char boundary
fn clamp(input: &str, offset: usize) -> usize {
    let mut offset = offset.min(input.len());
    while !input.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
