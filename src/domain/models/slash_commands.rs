#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }

        let prefix = args.remove(0);
        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_select()
            || cmd.is_upload()
            || cmd.is_files()
            || cmd.is_clear()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_select(&self) -> bool {
        return ["/s", "/select"].contains(&self.command.as_str());
    }

    pub fn is_upload(&self) -> bool {
        return ["/u", "/upload"].contains(&self.command.as_str());
    }

    pub fn is_files(&self) -> bool {
        return ["/f", "/files"].contains(&self.command.as_str());
    }

    pub fn is_clear(&self) -> bool {
        return ["/c", "/clear"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }
}
