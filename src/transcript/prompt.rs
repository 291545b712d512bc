//! Prompt recognition
//!
//! A [`PromptMatcher`] decides, for one physical line of a transcript, whether it starts
//! with a prompt (a new command), with a continuation marker (more of the current
//! command) or with neither (program output). Both patterns are anchored at the start of
//! the line; the whole match is the prompt/marker and the rest of the line is command text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Interactive bash prompts: `$`, `user@host:~$`, `(venv)user@host:~$`,
/// `[user@host dir] $`, `sh-4.2$`, with `#` and `%` variants.
static BASH_PROMPT: Lazy<Regex> = Lazy::new(|| {
    anchored(r"(?:\(\S+\))?(?:|sh\S*?|\w+\S+[@:]\S+(?:\s+\S+)?|\[\S+[@:][^\n]+\].+)[$#%]")
        .expect("bash prompt pattern")
});

/// `user@host ...$` style prompts.
static SHELL_PROMPT: Lazy<Regex> =
    Lazy::new(|| anchored(r"(?:\[?\S+@[^$#%]+\]?\s*)[$#%]").expect("shell prompt pattern"));

static BASH_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| anchored(">").expect("bash continuation pattern"));

fn anchored(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})", pattern))
}

#[derive(Debug, Clone)]
pub struct PromptMatcher {
    prompt: Regex,
    continuation: Option<Regex>,
}

impl PromptMatcher {
    /// Build a matcher from raw patterns. Both are implicitly anchored at line start.
    pub fn new(prompt: &str, continuation: Option<&str>) -> Result<Self, regex::Error> {
        Ok(PromptMatcher {
            prompt: anchored(prompt)?,
            continuation: continuation.map(anchored).transpose()?,
        })
    }

    /// Bash session prompts with `>` continuation lines.
    pub fn bash() -> Self {
        PromptMatcher {
            prompt: BASH_PROMPT.clone(),
            continuation: Some(BASH_CONTINUATION.clone()),
        }
    }

    /// Generic `user@host` shell session prompts, no continuation lines.
    pub fn shell() -> Self {
        PromptMatcher {
            prompt: SHELL_PROMPT.clone(),
            continuation: None,
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "bash" | "console" => Some(Self::bash()),
            "shell" | "shell-session" => Some(Self::shell()),
            _ => None,
        }
    }

    /// Replace the continuation pattern (`None` disables continuation lines).
    pub fn with_continuation(mut self, continuation: Option<&str>) -> Result<Self, regex::Error> {
        self.continuation = continuation.map(anchored).transpose()?;
        Ok(self)
    }

    /// Length in bytes of the prompt at the start of `line`.
    pub fn prompt_len(&self, line: &str) -> Option<usize> {
        self.prompt.find(line).map(|m| m.end())
    }

    /// Length in bytes of the continuation marker at the start of `line`.
    pub fn continuation_len(&self, line: &str) -> Option<usize> {
        self.continuation
            .as_ref()
            .and_then(|re| re.find(line))
            .map(|m| m.end())
    }
}
