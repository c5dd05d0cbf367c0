use std::fmt;

/// A chat id with an optional thread inside it, written `chat` or `chat/thread`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub chat_id: String,
    pub thread_id: Option<String>,
}

impl Recipient {
    /// Split on the first `/`. An empty thread part means no thread; anything
    /// after a second `/` is ignored.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.trim().split('/');
        let chat_id = parts.next().unwrap_or_default().to_string();
        let thread_id = parts
            .next()
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Self { chat_id, thread_id }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.thread_id {
            Some(thread) => write!(f, "{}/{}", self.chat_id, thread),
            None => f.write_str(&self.chat_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_chat() {
        assert_eq!(
            Recipient::parse("12345"),
            Recipient {
                chat_id: "12345".into(),
                thread_id: None
            }
        );
    }

    #[test]
    fn test_parse_with_thread() {
        let r = Recipient::parse("12345/67");
        assert_eq!(r.chat_id, "12345");
        assert_eq!(r.thread_id.as_deref(), Some("67"));
        assert_eq!(r.to_string(), "12345/67");
    }

    #[test]
    fn test_parse_trailing_slash() {
        assert_eq!(Recipient::parse("12345/").thread_id, None);
    }

    #[test]
    fn test_parse_trims_and_ignores_extra_parts() {
        let r = Recipient::parse("  -100987/12/ignored \n");
        assert_eq!(r.chat_id, "-100987");
        assert_eq!(r.thread_id.as_deref(), Some("12"));
    }
}
