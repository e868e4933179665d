/// Split one raw line into its fields.
///
/// Every `"` flips the in-quotes flag and is dropped; a `,` outside quotes
/// ends the current field. Fields are returned verbatim (no trimming), and the
/// final buffer is always emitted, so `""` yields `[""]` and a trailing comma
/// yields a trailing empty field. Unbalanced quotes are not an error: the scan
/// simply ends in whatever state it reached.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut fields = Vec::with_capacity(8);
    let mut buf = String::with_capacity(line.len());
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    fields.push(buf);

    fields
}
