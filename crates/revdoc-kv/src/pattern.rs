//! Redis-style glob matching for key scans.
//!
//! Supported syntax:
//! - `*` matches any sequence of characters, including `/` and the empty string
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character from a set or range;
//!   `[^a]` / `[!a]` negate the set
//! - `\x` matches `x` literally
//!
//! An unterminated `[` matches a literal `[`.

/// Returns `true` if `key` matches the glob `pattern`.
///
/// ```
/// use revdoc_kv::pattern::glob_match;
///
/// assert!(glob_match("workitems/*", "workitems/wi0/3"));
/// assert!(!glob_match("workitems/*", "expressions/0_0"));
/// ```
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = key.chars().collect();

    let (mut pi, mut si) = (0usize, 0usize);
    // Pattern index just past the most recent `*`, and the key index that
    // star is currently assumed to extend to.
    let mut backtrack: Option<(usize, usize)> = None;

    while si < s.len() {
        if pi < p.len() {
            if p[pi] == '*' {
                pi += 1;
                backtrack = Some((pi, si));
                continue;
            }
            if let Some(len) = match_one(&p[pi..], s[si]) {
                pi += len;
                si += 1;
                continue;
            }
        }
        match backtrack {
            Some((star_pi, star_si)) => {
                pi = star_pi;
                si = star_si + 1;
                backtrack = Some((star_pi, star_si + 1));
            }
            None => return false,
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

/// Match a single key character against the head of `p`. Returns the
/// number of pattern characters consumed on success.
fn match_one(p: &[char], c: char) -> Option<usize> {
    match p[0] {
        '?' => Some(1),
        '\\' => match p.get(1) {
            Some(&escaped) => (escaped == c).then_some(2),
            None => (c == '\\').then_some(1),
        },
        '[' => match match_class(p, c) {
            Some((matched, len)) => matched.then_some(len),
            None => (c == '[').then_some(1),
        },
        literal => (literal == c).then_some(1),
    }
}

/// Evaluate a `[...]` class at the head of `p`. Returns whether `c` is in
/// the class and the class length, or `None` if the class is unterminated.
fn match_class(p: &[char], c: char) -> Option<(bool, usize)> {
    let mut i = 1;
    let negated = matches!(p.get(1), Some('^') | Some('!'));
    if negated {
        i += 1;
    }

    let mut matched = false;
    loop {
        let mut lo = *p.get(i)?;
        if lo == ']' {
            break;
        }
        if lo == '\\' {
            i += 1;
            lo = *p.get(i)?;
        }

        let is_range = p.get(i + 1) == Some(&'-') && p.get(i + 2).is_some_and(|&hi| hi != ']');
        if is_range {
            let mut hi = p[i + 2];
            i += 3;
            if hi == '\\' {
                hi = *p.get(i)?;
                i += 1;
            }
            let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
            if lo <= c && c <= hi {
                matched = true;
            }
        } else {
            if lo == c {
                matched = true;
            }
            i += 1;
        }
    }

    Some((matched != negated, i + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn literal() {
        assert!(glob_match("msgs/m1", "msgs/m1"));
        assert!(!glob_match("msgs/m1", "msgs/m10"));
        assert!(!glob_match("msgs/m10", "msgs/m1"));
    }

    #[test]
    fn star() {
        assert!(glob_match("*", ""));
        assert!(glob_match("*", "anything/at/all"));
        assert!(glob_match("msgs/*", "msgs/"));
        assert!(glob_match("msgs/*", "msgs/m1"));
        assert!(glob_match("*/m1", "msgs/m1"));
        assert!(glob_match("w*s/*/1", "workitems/wi0/1"));
        assert!(!glob_match("w*s/*/1", "workitems/wi0/2"));
        assert!(!glob_match("msgs/*", "msgsx/m1"));
        assert!(!glob_match("msgs/*", "schedules/s1"));
    }

    #[test]
    fn question_mark() {
        assert!(glob_match("wi?", "wi0"));
        assert!(!glob_match("wi?", "wi"));
        assert!(!glob_match("wi?", "wi00"));
    }

    #[test]
    fn classes() {
        assert!(glob_match("wi[01]", "wi1"));
        assert!(!glob_match("wi[01]", "wi2"));
        assert!(glob_match("wi[0-9]", "wi7"));
        assert!(glob_match("wi[9-0]", "wi7"));
        assert!(glob_match("wi[^0]", "wi1"));
        assert!(glob_match("wi[!0]", "wi1"));
        assert!(!glob_match("wi[^0]", "wi0"));
        assert!(glob_match("wi[", "wi["));
    }

    #[test]
    fn escapes() {
        assert!(glob_match("a\\*b", "a*b"));
        assert!(!glob_match("a\\*b", "axb"));
        assert!(glob_match("a[\\]]b", "a]b"));
    }

    proptest! {
        #[test]
        fn plain_keys_match_themselves(key in "[a-z0-9_/.-]{0,40}") {
            prop_assert!(glob_match(&key, &key));
        }

        #[test]
        fn prefix_star_matches_any_suffix(
            prefix in "[a-z]{1,10}/",
            suffix in "[a-z0-9/]{0,20}",
        ) {
            let pattern = format!("{prefix}*");
            let key = format!("{prefix}{suffix}");
            prop_assert!(glob_match(&pattern, &key));
        }

        #[test]
        fn prefix_star_rejects_other_prefixes(
            a in "[a-m]{1,8}",
            b in "[n-z]{1,8}",
            suffix in "[a-z0-9]{0,10}",
        ) {
            let pattern = format!("{a}/*");
            let key = format!("{b}/{suffix}");
            prop_assert!(!glob_match(&pattern, &key));
        }
    }
}
