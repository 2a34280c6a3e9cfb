use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use dockhand_sequencer::{Step, StepContext};
use tracing::debug;

use crate::error::{InstallError, Result};
use crate::platform::LinuxDistro;
use crate::runner::CommandRunner;

const DEBIAN_INSTALL: &str = r#"
# Remove conflicting packages left over from earlier installs
apt-get remove -y docker docker-engine docker.io containerd runc 2>/dev/null || true

apt-get update
apt-get install -y ca-certificates curl gnupg lsb-release

# Docker's signing key and repository
install -m 0755 -d /etc/apt/keyrings
curl -fsSL https://download.docker.com/linux/ubuntu/gpg | gpg --dearmor -o /etc/apt/keyrings/docker.gpg
echo \
  "deb [arch=$(dpkg --print-architecture) signed-by=/etc/apt/keyrings/docker.gpg] \
  https://download.docker.com/linux/ubuntu $(lsb_release -cs) stable" \
  > /etc/apt/sources.list.d/docker.list

apt-get update
apt-get install -y docker-ce docker-ce-cli containerd.io
"#;

const DEBIAN_UNINSTALL: &str = r"
apt-get remove -y docker-ce docker-ce-cli containerd.io
apt-get purge -y docker-ce docker-ce-cli containerd.io
apt-get autoremove -y
";

const FEDORA_INSTALL: &str = r"
# Remove conflicting packages left over from earlier installs
dnf remove -y docker docker-client docker-common docker-engine podman 2>/dev/null || true

dnf -y install dnf-plugins-core
dnf config-manager --add-repo https://download.docker.com/linux/fedora/docker-ce.repo
dnf install -y docker-ce docker-ce-cli containerd.io
";

const FEDORA_UNINSTALL: &str = r"
dnf remove -y docker-ce docker-ce-cli containerd.io
";

const GENERIC_INSTALL: &str = r"
# Distribution-agnostic convenience script
curl -fsSL https://get.docker.com -o get-docker.sh
sh get-docker.sh
rm -f get-docker.sh
";

const GENERIC_UNINSTALL: &str = r"
if command -v docker > /dev/null; then
    systemctl stop docker 2>/dev/null || true
    which docker-compose && rm -f $(which docker-compose) || true
    which docker && rm -f $(which docker) || true
fi
";

fn install_script(distro: LinuxDistro, add_user_to_group: bool) -> String {
    let mut script = String::from("#!/bin/bash\nset -e\n\necho 'Starting Docker installation...'\n");
    script.push_str(match distro {
        LinuxDistro::Debian => DEBIAN_INSTALL,
        LinuxDistro::Fedora => FEDORA_INSTALL,
        LinuxDistro::Other => GENERIC_INSTALL,
    });
    if add_user_to_group {
        script.push_str(
            "\n# Let the invoking user talk to the daemon without sudo\n\
             usermod -aG docker \"${SUDO_USER:-$USER}\"\n",
        );
    }
    script.push_str("\necho 'Docker installation completed'\n");
    script
}

fn uninstall_script(distro: LinuxDistro) -> String {
    let mut script = String::from("#!/bin/bash\nset -e\n\necho 'Uninstalling Docker...'\n");
    script.push_str(match distro {
        LinuxDistro::Debian => DEBIAN_UNINSTALL,
        LinuxDistro::Fedora => FEDORA_UNINSTALL,
        LinuxDistro::Other => GENERIC_UNINSTALL,
    });
    script.push_str("\necho 'Docker uninstallation completed'\n");
    script
}

/// Write a generated shell script to a scratch file and register it with
/// the resource registry so it is removed once the run is over.
fn write_script(label: &str, contents: &str, ctx: &StepContext<'_>) -> Result<PathBuf> {
    let mut file = tempfile::Builder::new()
        .prefix(label)
        .suffix(".sh")
        .tempfile()
        .map_err(|source| InstallError::ScriptWrite {
            path: std::env::temp_dir(),
            source,
        })?;
    file.write_all(contents.as_bytes())
        .map_err(|source| InstallError::ScriptWrite {
            path: file.path().to_path_buf(),
            source,
        })?;
    let (_, path) = file.keep().map_err(|error| InstallError::ScriptWrite {
        path: error.file.path().to_path_buf(),
        source: error.error,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).map_err(
            |source| InstallError::ScriptWrite {
                path: path.clone(),
                source,
            },
        )?;
    }

    debug!(script = %path.display(), "wrote installer script");
    ctx.resources().register(&path);
    Ok(path)
}

/// Installs the Docker engine packages for the detected distribution by
/// generating an install script and streaming it through `sudo`.
pub struct InstallPackagesStep {
    distro: LinuxDistro,
    add_user_to_group: bool,
    runner: Arc<dyn CommandRunner>,
}

impl InstallPackagesStep {
    #[must_use]
    pub fn new(distro: LinuxDistro, add_user_to_group: bool, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            distro,
            add_user_to_group,
            runner,
        }
    }
}

impl Step for InstallPackagesStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Installing Docker packages"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Preparing Docker installation...");
        let script = write_script(
            "dockhand-install",
            &install_script(self.distro, self.add_user_to_group),
            ctx,
        )?;
        let script_arg = script.to_string_lossy().into_owned();

        ctx.log("Installing Docker (requires sudo)...");
        self.runner.stream("sudo", &["bash", &script_arg], ctx)
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Removing Docker packages...");
        let script = write_script("dockhand-uninstall", &uninstall_script(self.distro), ctx)?;
        let script_arg = script.to_string_lossy().into_owned();
        self.runner.stream("sudo", &["bash", &script_arg], ctx)
    }
}

/// Enables the Docker systemd unit and starts it.
pub struct EnableServiceStep {
    runner: Arc<dyn CommandRunner>,
}

impl EnableServiceStep {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Step for EnableServiceStep {
    type Error = InstallError;

    fn description(&self) -> &str {
        "Enabling Docker service"
    }

    fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Configuring Docker to start on boot...");
        self.runner
            .run_checked("sudo", &["systemctl", "enable", "docker"])?;
        ctx.log("Starting Docker service...");
        self.runner
            .run_checked("sudo", &["systemctl", "start", "docker"])?;
        Ok(())
    }

    fn rollback(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        ctx.log("Stopping Docker service...");
        self.runner.run("sudo", &["systemctl", "stop", "docker"])?;
        self.runner
            .run("sudo", &["systemctl", "disable", "docker"])?;
        Ok(())
    }

    fn verify_completion(&self, _ctx: &StepContext<'_>) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["is-active", "--quiet", "docker"])
            .map(|_| ())
    }
}
