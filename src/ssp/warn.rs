fn sanitize_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for token in value.split_whitespace() {
        let cleaned: String = token.chars().filter(|c| !c.is_control()).collect();
        if cleaned.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('_');
        }
        out.push_str(&cleaned);
    }
    if out.is_empty() { "na".to_string() } else { out }
}

pub fn emit(code: &str, stage: &str, subject: &str, reason: &str, err: &str) {
    eprintln!(
        "SSP_WARN code={} stage={} subject={} reason={} err={}",
        sanitize_value(code),
        sanitize_value(stage),
        sanitize_value(subject),
        sanitize_value(reason),
        sanitize_value(err),
    );
}

#[cfg(test)]
mod tests {
    use super::sanitize_value;

    #[test]
    fn sanitize_value_rewrites_whitespace() {
        assert_eq!(sanitize_value("a b\tc"), "a_b_c");
    }

    #[test]
    fn sanitize_value_keeps_non_ascii_city_names() {
        assert_eq!(
            sanitize_value("São José dos Campos"),
            "São_José_dos_Campos"
        );
    }

    #[test]
    fn sanitize_value_falls_back_for_empty() {
        assert_eq!(sanitize_value("   "), "na");
    }
}
