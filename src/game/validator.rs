use crate::error::ClueRejection;

pub struct WordValidator;

impl WordValidator {
    /// Check a clue against the secret word and return the accepted token.
    ///
    /// A clue is exactly one whitespace-delimited token and must not be the
    /// secret word itself, compared case-insensitively.
    pub fn validate_clue(text: &str, secret_word: &str) -> Result<String, ClueRejection> {
        let mut tokens = text.split_whitespace();
        let clue = match (tokens.next(), tokens.next()) {
            (Some(token), None) => token,
            _ => return Err(ClueRejection::NotOneWord),
        };

        if Self::same_word(clue, secret_word) {
            return Err(ClueRejection::IsSecretWord);
        }

        Ok(clue.to_string())
    }

    /// Exact, case-insensitive match of a guess against the secret word
    pub fn is_correct_guess(guess: &str, secret_word: &str) -> bool {
        Self::same_word(guess.trim(), secret_word)
    }

    fn same_word(a: &str, b: &str) -> bool {
        a.to_lowercase() == b.to_lowercase()
    }
}
