use crate::{
    gateway::{escape_html, render, Localizer},
    models::{GameState, Player, Standing},
};

use super::EndReason;

/// Message texts for one language
pub struct Texts<'a> {
    localizer: &'a dyn Localizer,
    lang: &'a str,
}

impl<'a> Texts<'a> {
    pub fn new(localizer: &'a dyn Localizer, lang: &'a str) -> Self {
        Self { localizer, lang }
    }

    pub fn get(&self, key: &str, args: &[(&str, &str)]) -> String {
        render(&self.localizer.get(self.lang, key), args)
    }

    fn name(player: &Player) -> String {
        escape_html(&player.display_name())
    }

    fn numbered(players: &[Player]) -> String {
        players
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {}", i + 1, Self::name(p)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lobby_header(&self, game: &GameState) -> String {
        format!(
            "{}\n{}",
            self.get("lobby_opened", &[]),
            self.get("lobby_host", &[("host_name", &Self::name(&game.host))])
        )
    }

    fn lobby_players(&self, game: &GameState) -> String {
        if game.players().is_empty() {
            return self.get("lobby_no_players", &[]);
        }
        self.get(
            "lobby_players_joined",
            &[
                ("player_count", &game.players().len().to_string()),
                ("player_list", &Self::numbered(game.players())),
            ],
        )
    }

    /// Lobby announcement while joins are open
    pub fn lobby(&self, game: &GameState) -> String {
        format!(
            "{}\n{}\n\n{}\n\n{}",
            self.lobby_header(game),
            self.get(
                "lobby_join_prompt",
                &[("total_rounds", &game.total_rounds.to_string())]
            ),
            self.lobby_players(game),
            self.get(
                "lobby_play_instruction",
                &[("host_name", &Self::name(&game.host))]
            ),
        )
    }

    /// Lobby announcement once the game has started
    pub fn lobby_closed(&self, game: &GameState) -> String {
        format!(
            "{}\n\n{}\n\n{}",
            self.lobby_header(game),
            self.lobby_players(game),
            self.get("lobby_closed", &[])
        )
    }

    pub fn game_started(&self, game: &GameState) -> String {
        self.get(
            "game_started_announcement",
            &[("turn_order", &Self::numbered(game.turn_order()))],
        )
    }

    pub fn round_start(&self, game: &GameState, clue_giver: &Player) -> String {
        self.get(
            "round_start_announcement",
            &[
                ("current_round", &game.round.to_string()),
                ("total_rounds", &game.total_rounds.to_string()),
                ("clue_giver_name", &Self::name(clue_giver)),
            ],
        )
    }

    pub fn secret_word_prompt(&self, clue_giver: &Player, word: &str) -> String {
        self.get(
            "secret_word_prompt",
            &[("name", &Self::name(clue_giver)), ("word", &escape_html(word))],
        )
    }

    pub fn with_name(&self, key: &str, player: &Player) -> String {
        self.get(key, &[("name", &Self::name(player))])
    }

    pub fn with_host(&self, key: &str, game: &GameState) -> String {
        self.get(key, &[("host_name", &Self::name(&game.host))])
    }

    pub fn with_word(&self, key: &str, word: &str) -> String {
        self.get(key, &[("word", &escape_html(word))])
    }

    /// Solo hint line; the first hint has its own wording
    pub fn solo_hint(&self, number: usize, hint: &str) -> String {
        let hint = escape_html(hint);
        if number <= 1 {
            self.get("solo_first_hint", &[("hint", &hint)])
        } else {
            self.get(
                "solo_next_hint",
                &[("hint_number", &number.to_string()), ("hint", &hint)],
            )
        }
    }

    pub fn solo_solved(&self, hints_given: usize, word: &str, score: i64) -> String {
        self.get(
            "solo_guess_correct",
            &[
                ("hints_given", &hints_given.to_string()),
                ("word", &escape_html(word)),
                ("score", &score.to_string()),
            ],
        )
    }

    /// Public clue message, listing wrong guesses once there are any
    pub fn clue_announcement(&self, game: &GameState) -> String {
        let giver = game
            .clue_giver
            .as_ref()
            .map(Self::name)
            .unwrap_or_default();
        let mut text = self.get(
            "clue_announcement_in_group",
            &[
                ("round", &game.round.to_string()),
                ("giver_name", &giver),
                ("clue", &escape_html(game.clue.as_deref().unwrap_or_default())),
            ],
        );
        if !game.wrong_guesses.is_empty() {
            text.push_str("\n\n");
            text.push_str(&self.get("wrong_guesses_title", &[]));
            text.push('\n');
            for guess in &game.wrong_guesses {
                text.push_str(&self.get("wrong_guess_entry", &[("guess", &escape_html(guess))]));
            }
        }
        text
    }

    pub fn round_won(&self, winner: &Player, word: &str, points: i64) -> String {
        self.get(
            "round_won_announcement",
            &[
                ("winner_name", &Self::name(winner)),
                ("word", &escape_html(word)),
                ("points", &points.to_string()),
            ],
        )
    }

    pub fn scoreboard(&self, standings: &[Standing]) -> String {
        let mut text = self.get("end_of_round_scoreboard_title", &[]);
        for standing in standings {
            text.push_str(&self.get(
                "end_of_round_scoreboard_entry",
                &[
                    ("player_name", &Self::name(&standing.player)),
                    ("points", &standing.points.to_string()),
                ],
            ));
        }
        text
    }

    /// Closing message: reason, final scoreboard, winner
    pub fn summary(
        &self,
        reason: EndReason,
        total_rounds: u32,
        standings: &[Standing],
        winner: Option<&Standing>,
    ) -> String {
        let mut text = match reason {
            EndReason::Completed => self.get(
                "game_over_announcement",
                &[("total_rounds", &total_rounds.to_string())],
            ),
            EndReason::Host => self.get("game_ended_by_host", &[]),
        };
        text.push_str(&self.scoreboard(standings));
        text.push_str(&match winner {
            Some(standing) => self.get(
                "final_winner_announcement",
                &[("winner_name", &Self::name(&standing.player))],
            ),
            None => self.get("final_no_winner", &[]),
        });
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gateway::JsonLocalizer, models::UserProfile};

    fn player(id: i64, name: &str) -> Player {
        Player::from_profile(&UserProfile::new(id, name))
    }

    #[test]
    fn test_lobby_lists_players_in_join_order() {
        let localizer = JsonLocalizer::builtin();
        let texts = Texts::new(&localizer, "en");
        let mut game = GameState::new(-1, player(1, "Ana"), 5, "en".into());
        game.add_player(player(2, "Budi")).unwrap();

        let text = texts.lobby(&game);
        assert!(text.contains("Players joined (2):\n1. Ana\n2. Budi"));
        assert!(text.contains("<b>5</b> rounds"));
    }

    #[test]
    fn test_names_are_escaped() {
        let localizer = JsonLocalizer::builtin();
        let texts = Texts::new(&localizer, "en");
        let game = GameState::new(-1, player(1, "<script>"), 5, "en".into());
        assert!(texts.lobby(&game).contains("&lt;script&gt;"));
        assert!(!texts.lobby(&game).contains("<script>"));
    }

    #[test]
    fn test_clue_announcement_lists_wrong_guesses() {
        let localizer = JsonLocalizer::builtin();
        let texts = Texts::new(&localizer, "en");
        let mut game = GameState::new(-1, player(1, "Ana"), 5, "en".into());
        game.round = 2;
        game.clue_giver = Some(player(1, "Ana"));
        game.clue = Some("fruit".into());

        let plain = texts.clue_announcement(&game);
        assert!(plain.contains("Clue from Ana: <b>fruit</b>"));
        assert!(!plain.contains("Wrong guesses"));

        game.wrong_guesses = vec!["pear".into(), "plum".into()];
        let listed = texts.clue_announcement(&game);
        assert!(listed.ends_with("❌ pear\n❌ plum\n"));
    }

    #[test]
    fn test_scoreboard_keeps_braces_in_names() {
        let localizer = JsonLocalizer::builtin();
        let texts = Texts::new(&localizer, "en");
        let standings = vec![
            Standing {
                player: player(1, "{points}"),
                points: 15,
            },
            Standing {
                player: player(2, "Budi"),
                points: 0,
            },
        ];
        let text = texts.scoreboard(&standings);
        assert!(text.contains("{points}: 15\nBudi: 0"));
    }

    #[test]
    fn test_solo_texts_escape_content() {
        let localizer = JsonLocalizer::builtin();
        let texts = Texts::new(&localizer, "en");
        assert_eq!(texts.solo_hint(1, "<sea>"), "Hint 1: <b>&lt;sea&gt;</b>");
        assert_eq!(
            texts.solo_hint(2, "R&D"),
            "Not quite. Hint 2: <b>R&amp;D</b>"
        );
        assert!(texts
            .solo_solved(2, "<b>", 90)
            .contains("The word was <b>&lt;b&gt;</b>. You used 2 hint(s) and earn 90 points."));
    }

    #[test]
    fn test_summary_without_winner() {
        let localizer = JsonLocalizer::builtin();
        let texts = Texts::new(&localizer, "en");
        let standings = vec![Standing {
            player: player(1, "Ana"),
            points: 0,
        }];
        let text = texts.summary(EndReason::Host, 10, &standings, None);
        assert!(text.starts_with("🛑 The host ended the game."));
        assert!(text.contains("Ana: 0"));
        assert!(text.ends_with("Nobody scored this time."));
    }
}
