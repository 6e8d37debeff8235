/// Positional enumeration markers for section rows.

/// Prefix every row after the first with its position, `"{i})"`.
///
/// Row 0 is normally the section marker line and is left alone. The
/// marker is glued directly onto the row text, so `"    wall > Immovable"`
/// at index 2 becomes `"2)    wall > Immovable"`. Applying this twice
/// stacks markers; call it once per finished ordering.
pub fn enumerate_rows<S: AsRef<str>>(rows: &[S]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if i == 0 {
                row.as_ref().to_string()
            } else {
                format!("{}){}", i, row.as_ref())
            }
        })
        .collect()
}

/// Prepend the section marker to `rows` and enumerate the result.
pub fn enumerate_section<S: AsRef<str>>(marker: &str, rows: &[S]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(marker);
    lines.extend(rows.iter().map(|r| r.as_ref()));
    enumerate_rows(&lines)
}
