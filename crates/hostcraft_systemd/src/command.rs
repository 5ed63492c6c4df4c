use std::{
    fmt,
    path::{Path, PathBuf},
};

/// Process started by the service unit.
#[derive(Debug, Clone, PartialEq)]
pub enum StartupCommand {
    /// `java -Xms -Xmx [jvm args] -jar <jar> [server args]`
    Jar {
        java: PathBuf,
        min_heap: String,
        max_heap: String,
        jvm_args: Vec<String>,
        jar: PathBuf,
        args: Vec<String>,
    },
    /// `java -Xms -Xmx [jvm args] @<args file> [server args]`, used for the
    /// Forge layout where the installer writes the classpath to a file.
    ArgsFile {
        java: PathBuf,
        min_heap: String,
        max_heap: String,
        jvm_args: Vec<String>,
        args_file: PathBuf,
        args: Vec<String>,
    },
    /// Arbitrary program, e.g. the Hytale launcher that authenticates first.
    Program { program: PathBuf, args: Vec<String> },
}

impl StartupCommand {
    pub fn argv(&self) -> Vec<String> {
        match self {
            StartupCommand::Jar {
                java,
                min_heap,
                max_heap,
                jvm_args,
                jar,
                args,
            } => {
                let mut argv = heap_args(java, min_heap, max_heap, jvm_args);
                argv.push("-jar".to_string());
                argv.push(jar.display().to_string());
                argv.extend(args.iter().cloned());
                argv
            }
            StartupCommand::ArgsFile {
                java,
                min_heap,
                max_heap,
                jvm_args,
                args_file,
                args,
            } => {
                let mut argv = heap_args(java, min_heap, max_heap, jvm_args);
                argv.push(format!("@{}", args_file.display()));
                argv.extend(args.iter().cloned());
                argv
            }
            StartupCommand::Program { program, args } => {
                let mut argv = vec![program.display().to_string()];
                argv.extend(args.iter().cloned());
                argv
            }
        }
    }
}

fn heap_args(java: &Path, min_heap: &str, max_heap: &str, jvm_args: &[String]) -> Vec<String> {
    let mut argv = vec![
        java.display().to_string(),
        format!("-Xms{}", min_heap),
        format!("-Xmx{}", max_heap),
    ];
    argv.extend(jvm_args.iter().cloned());
    argv
}

/// Renders the command in `ExecStart=` syntax.
impl fmt::Display for StartupCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argv = self.argv();
        for (i, arg) in argv.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(&quote_arg(arg))?;
        }
        Ok(())
    }
}

/// Quotes one argument for systemd's command line parser. `%` and `$` are
/// doubled so specifier and variable expansion leave them alone.
pub fn quote_arg(arg: &str) -> String {
    let escaped = arg.replace('%', "%%").replace('$', "$$");
    let needs_quotes = escaped.is_empty()
        || escaped
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'' || c == '\\' || c == ';');
    if !needs_quotes {
        return escaped;
    }

    let mut quoted = String::with_capacity(escaped.len() + 2);
    quoted.push('"');
    for c in escaped.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jar_command() {
        let command = StartupCommand::Jar {
            java: PathBuf::from("/usr/lib/jvm/java-21-openjdk-amd64/bin/java"),
            min_heap: "1G".to_string(),
            max_heap: "4G".to_string(),
            jvm_args: vec!["-XX:+UseG1GC".to_string()],
            jar: PathBuf::from("/srv/mc/server.jar"),
            args: vec!["--nogui".to_string()],
        };
        assert_eq!(
            command.to_string(),
            "/usr/lib/jvm/java-21-openjdk-amd64/bin/java -Xms1G -Xmx4G -XX:+UseG1GC -jar /srv/mc/server.jar --nogui"
        );
    }

    #[test]
    fn test_args_file_command() {
        let command = StartupCommand::ArgsFile {
            java: PathBuf::from("java"),
            min_heap: "2G".to_string(),
            max_heap: "2G".to_string(),
            jvm_args: Vec::new(),
            args_file: PathBuf::from("libraries/net/minecraftforge/forge/1.20.1-47.2.0/unix_args.txt"),
            args: vec!["nogui".to_string()],
        };
        assert_eq!(
            command.to_string(),
            "java -Xms2G -Xmx2G @libraries/net/minecraftforge/forge/1.20.1-47.2.0/unix_args.txt nogui"
        );
    }

    #[test]
    fn test_quoting() {
        assert_eq!(quote_arg("plain"), "plain");
        assert_eq!(quote_arg("two words"), "\"two words\"");
        assert_eq!(quote_arg("50%"), "50%%");
        assert_eq!(quote_arg("$HOME"), "$$HOME");
        assert_eq!(quote_arg(""), "\"\"");
        assert_eq!(quote_arg("say \"hi\""), "\"say \\\"hi\\\"\"");
    }
}
