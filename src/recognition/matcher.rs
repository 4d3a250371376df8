//! Answer matching

/// First option, in list order, contained in the transcript
///
/// Comparison is case-insensitive substring search. When one option is a
/// substring of another the earlier one in the list wins.
pub fn match_answer<'a, S: AsRef<str>>(transcript: &str, options: &'a [S]) -> Option<&'a str> {
    let transcript = transcript.to_lowercase();
    options
        .iter()
        .map(AsRef::as_ref)
        .find(|option| transcript.contains(&option.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_hit_in_option_order() {
        let options = ["yes", "no", "maybe"];
        assert_eq!(match_answer("i think no way", &options), Some("no"));
    }

    #[test]
    fn test_no_match() {
        let options = ["red", "blue"];
        assert_eq!(match_answer("green", &options), None);
    }

    #[test]
    fn test_case_insensitive() {
        let options = vec!["Strongly Agree".to_string(), "Agree".to_string()];
        assert_eq!(
            match_answer("I STRONGLY agree with that", &options),
            Some("Strongly Agree")
        );
    }

    #[test]
    fn test_option_order_not_position() {
        // "no" comes first in the transcript but "yes" first in the list
        let options = ["yes", "no"];
        assert_eq!(match_answer("no, yes", &options), Some("yes"));
    }

    #[test]
    fn test_empty_options() {
        let options: [&str; 0] = [];
        assert_eq!(match_answer("anything", &options), None);
    }
}
