//! Slash-command registration payloads.

use {
    rollcall_channels::{CommandDefinition, OptionDefinition, OptionKind, command_definitions},
    serenity::all::{CommandOptionType, CreateCommand, CreateCommandOption},
};

/// Every command in the catalogue as a serenity builder.
pub fn create_commands() -> Vec<CreateCommand> {
    command_definitions()
        .into_iter()
        .map(create_command)
        .collect()
}

fn create_command(def: CommandDefinition) -> CreateCommand {
    def.options.into_iter().fold(
        CreateCommand::new(def.name).description(def.description),
        |command, option| command.add_option(create_option(option)),
    )
}

fn create_option(option: OptionDefinition) -> CreateCommandOption {
    let kind = match option.kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
    };
    option.choices.into_iter().fold(
        CreateCommandOption::new(kind, option.name, option.description).required(option.required),
        |builder, choice| builder.add_string_choice(choice.name, choice.value),
    )
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_command_payload() {
        let commands = serde_json::to_value(create_commands()).unwrap();
        let check = &commands[0];
        assert_eq!(check["name"], "check");
        assert_eq!(check["description"], "Create a ready check");

        let options = check["options"].as_array().unwrap();
        assert_eq!(options.len(), 3);
        // 3 = string, 4 = integer
        assert_eq!(options[0]["type"], 3);
        assert_eq!(options[0]["required"], true);
        assert_eq!(options[0]["choices"][0]["value"], "channel");
        assert_eq!(options[1]["name"], "count");
        assert_eq!(options[1]["type"], 4);
    }

    #[test]
    fn every_command_is_registered() {
        let commands = serde_json::to_value(create_commands()).unwrap();
        let names: Vec<_> = commands
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["check", "cancel", "ready", "unready", "status", "help"]);
    }
}
