//! Terminal prompts for the scaffold wizard using cliclack

use crate::scaffold::wizard::{Choice, Prompter, Validator};
use anyhow::Result;

/// [`Prompter`] backed by cliclack
pub struct CliclackPrompter;

impl Prompter for CliclackPrompter {
    fn intro(&mut self, title: &str) -> Result<()> {
        cliclack::intro(title)?;
        Ok(())
    }

    fn input(
        &mut self,
        message: &str,
        default: &str,
        required: bool,
        validator: Option<Validator>,
    ) -> Result<String> {
        let mut input = cliclack::input(message).required(required);
        if !default.is_empty() {
            input = input.placeholder(default).default_input(default);
        }
        if let Some(validator) = validator {
            input = input.validate(move |value: &String| validator(value));
        }

        let value: String = input.interact()?;
        Ok(value)
    }

    fn select(&mut self, message: &str, choices: &[Choice], default: &str) -> Result<String> {
        let mut select = cliclack::select(message);
        for choice in choices {
            select = select.item(choice.value.clone(), &choice.label, "");
        }
        if choices.iter().any(|choice| choice.value == default) {
            select = select.initial_value(default.to_string());
        }

        Ok(select.interact()?)
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Ok(cliclack::confirm(message).initial_value(default).interact()?)
    }
}
