//! Shell-style wildcard matching for file names.
//!
//! Supports `*` (any run of characters) and `?` (exactly one character).
//! Patterns are matched against a single path component, never across `/`.

/// True if `name` matches `pattern`.
pub fn matches(pattern: &str, name: &str) -> bool {
  let pattern: Vec<char> = pattern.chars().collect();
  let name: Vec<char> = name.chars().collect();

  let (mut p, mut n) = (0, 0);
  // Position of the last `*` seen and the name index it was tried at.
  let mut backtrack: Option<(usize, usize)> = None;

  while n < name.len() {
    match pattern.get(p) {
      Some('*') => {
        backtrack = Some((p, n));
        p += 1;
      }
      Some('?') => {
        p += 1;
        n += 1;
      }
      Some(c) if *c == name[n] => {
        p += 1;
        n += 1;
      }
      _ => match backtrack {
        Some((star, tried)) => {
          p = star + 1;
          n = tried + 1;
          backtrack = Some((star, tried + 1));
        }
        None => return false,
      },
    }
  }
  pattern[p..].iter().all(|c| *c == '*')
}

/// True if `name` matches any of `patterns`.
pub fn matches_any<S: AsRef<str>>(patterns: &[S], name: &str) -> bool {
  patterns.iter().any(|pattern| matches(pattern.as_ref(), name))
}

/// Split a comma separated pattern list, dropping empty entries.
pub fn parse_list(list: &str) -> Vec<String> {
  list
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}
