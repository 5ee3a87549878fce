//! Terminal menu: ask, adjust profile, show profile, exit.
//!
//! Generic over the reader and writer so the whole loop can be driven from a script.

use std::io::{self, BufRead, Write};

use scry_core::{clamp_level, Goal, Orchestrator, ProfileSetting, ScryError};

/// Whether the loop keeps going after a menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

const FAREWELL: &str = "May your path be illuminated. Farewell. ✨";

fn setting_label(setting: ProfileSetting) -> &'static str {
    match setting {
        ProfileSetting::Scientific => "Scientific inclination",
        ProfileSetting::Mystical => "Mystical inclination",
        ProfileSetting::Philosophical => "Philosophical inclination",
        ProfileSetting::Depth => "Depth level",
        ProfileSetting::Goal => "Primary goal",
    }
}

pub struct Console<'a, R, W> {
    orchestrator: &'a Orchestrator,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(orchestrator: &'a Orchestrator, input: R, output: W) -> Self {
        Self {
            orchestrator,
            input,
            output,
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run until the user exits or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        writeln!(self.output, "✨ Welcome to Spirit Scry ✨")?;
        writeln!(self.output, "Your adaptive spiritual guide")?;

        loop {
            writeln!(self.output, "\nOptions:")?;
            writeln!(self.output, "1. Ask a spiritual question")?;
            writeln!(self.output, "2. Adjust your profile")?;
            writeln!(self.output, "3. Show current profile")?;
            writeln!(self.output, "4. Exit")?;

            let Some(choice) = self.read_line("\nChoose an option (1-4): ")? else {
                writeln!(self.output, "\n{}", FAREWELL)?;
                return Ok(());
            };

            let flow = match choice.trim() {
                "1" => self.ask().await?,
                "2" => self.adjust().await?,
                "3" => {
                    let profile = self.orchestrator.profile().await;
                    writeln!(self.output, "\n{}", profile.summary())?;
                    Flow::Continue
                }
                "4" => {
                    writeln!(self.output, "{}", FAREWELL)?;
                    Flow::Exit
                }
                other => {
                    writeln!(self.output, "Unknown option {:?}; choose 1-4.", other)?;
                    Flow::Continue
                }
            };
            if flow == Flow::Exit {
                return Ok(());
            }
        }
    }

    async fn ask(&mut self) -> io::Result<Flow> {
        let Some(question) = self.read_line("\nWhat is your spiritual question?\n> ")? else {
            return Ok(Flow::Exit);
        };
        let trimmed = question.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            return Ok(Flow::Exit);
        }

        let depth = self.orchestrator.profile().await.depth;
        writeln!(self.output, "\n🧠 Processing your question with depth level {}...", depth)?;
        self.output.flush()?;

        match self.orchestrator.ask(&question).await {
            Ok(reply) => writeln!(self.output, "\n🕯️  Spirit Scry responds:\n{}", reply.text)?,
            Err(e) => {
                tracing::error!(error = %e, "exchange could not be saved");
                writeln!(self.output, "\nThe guide answered, but the profile could not be saved: {}", e)?;
            }
        }
        Ok(Flow::Continue)
    }

    async fn adjust(&mut self) -> io::Result<Flow> {
        writeln!(self.output, "\nAdjust your spiritual profile:")?;
        for (n, setting) in ProfileSetting::ALL.iter().enumerate() {
            let range = if *setting == ProfileSetting::Goal { "" } else { " (1-5)" };
            writeln!(self.output, "{}. {}{}", n + 1, setting_label(*setting), range)?;
        }

        let Some(choice) = self.read_line("Choose setting to adjust (1-5): ")? else {
            return Ok(Flow::Exit);
        };
        let setting = match choice.trim().parse::<usize>() {
            Ok(n @ 1..=5) => ProfileSetting::ALL[n - 1],
            _ => {
                writeln!(self.output, "Unknown setting {:?}.", choice.trim())?;
                return Ok(Flow::Continue);
            }
        };

        let value = if setting == ProfileSetting::Goal {
            writeln!(self.output, "Goals: {}", Goal::choices())?;
            let Some(raw) = self.read_line("Primary goal: ")? else {
                return Ok(Flow::Exit);
            };
            serde_json::Value::from(raw.trim())
        } else {
            let prompt = format!("{} (1-5): ", setting_label(setting));
            let Some(raw) = self.read_line(&prompt)? else {
                return Ok(Flow::Exit);
            };
            match raw.trim().parse::<i64>() {
                Ok(n) => serde_json::Value::from(clamp_level(n)),
                Err(_) => {
                    writeln!(self.output, "Please enter a whole number from 1 to 5.")?;
                    return Ok(Flow::Continue);
                }
            }
        };

        match self.orchestrator.update_setting(setting.as_str(), &value).await {
            Ok(outcome) => writeln!(self.output, "{}", outcome)?,
            Err(e @ ScryError::InvalidSetting { .. }) => writeln!(self.output, "{}", e)?,
            Err(e) => {
                tracing::error!(error = %e, "profile could not be saved");
                writeln!(self.output, "Could not save your profile: {}", e)?;
            }
        }
        Ok(Flow::Continue)
    }

    /// Print `prompt`, then read one line without its terminator. `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed_len);
        Ok(Some(line))
    }
}
