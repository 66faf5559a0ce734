//! Count-dependent message templates.

/// Fills a check header template for `count` offending objects.
///
/// - `%is` becomes `is` for a count of one, `are` otherwise
/// - `%d` becomes the count
/// - `%s` becomes empty for a count of one, `s` otherwise
///
/// ```
/// use tempus_timing::message::error_msg_subst;
///
/// assert_eq!(
///     error_msg_subst("There %is %d input port%s missing set_input_delay.", 2),
///     "There are 2 input ports missing set_input_delay."
/// );
/// ```
pub fn error_msg_subst(template: &str, count: usize) -> String {
    let singular = count == 1;
    let mut out = String::with_capacity(template.len() + 4);
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        if let Some(tail) = after.strip_prefix("is") {
            out.push_str(if singular { "is" } else { "are" });
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('d') {
            out.push_str(&count.to_string());
            rest = tail;
        } else if let Some(tail) = after.strip_prefix('s') {
            if !singular {
                out.push('s');
            }
            rest = tail;
        } else {
            out.push('%');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}
