//! Downstream command lines issued for network instances.
//!
//! Every command targets one instance with `-H <name>`; `-n` negates it.
//! Subsystems with their own saved configuration get a backup, rollback and
//! save triple registered once per batch ahead of the first command touching
//! them.

use camino::{Utf8Path, Utf8PathBuf};
use ncm_command::{Action, CommandBatch, ShellAction};
use ncm_config::{Config, FrrRestartMode};

use crate::handler::HandlerError;
use crate::inventory::IfName;
use crate::schema::{Config as InstanceConfig, NetworkInstanceType};

/// Downstream subsystems registered once per batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NiUpdate {
    /// The routing daemon's configuration.
    Vty,
    /// Kernel parameters.
    Sysctl,
    /// VRF settings.
    SysVrf,
    /// VLAN devices.
    Network,
}

/// Paths of the downstream tools and the routing-daemon recovery mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tools {
    /// Container manager.
    pub lxd: Utf8PathBuf,
    /// Container initialiser.
    pub lxcinit: Utf8PathBuf,
    /// System settings tool.
    pub sys: Utf8PathBuf,
    /// Routing daemon shell.
    pub vty: Utf8PathBuf,
    /// How a failed vty change is recovered.
    pub frr_restart: FrrRestartMode,
}

impl Tools {
    /// Resolves the tools named by `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            lxd: config.lxd_path(),
            lxcinit: config.lxcinit_path(),
            sys: config.sys_path(),
            vty: config.vty_path(),
            frr_restart: config.frr_auto_restart(),
        }
    }
}

/// Fills a batch for one instance.
pub(crate) struct NiCommands<'a> {
    tools: &'a Tools,
    name: &'a str,
    batch: &'a mut CommandBatch<NiUpdate>,
}

impl<'a> NiCommands<'a> {
    pub(crate) const fn new(
        tools: &'a Tools,
        name: &'a str,
        batch: &'a mut CommandBatch<NiUpdate>,
    ) -> Self {
        Self { tools, name, batch }
    }

    fn shell(&self, program: &Utf8Path, args: &[&str], negate: bool) -> Box<dyn Action> {
        ShellAction::new(program)
            .args(args.iter().copied())
            .args(negate.then_some("-n"))
            .args(["-H", self.name])
            .boxed()
    }

    fn do_undo(&mut self, program: &Utf8Path, args: &[&str], add: bool) {
        let forward = self.shell(program, args, !add);
        let backward = self.shell(program, args, add);
        self.batch.add_cmd(Some(forward), Some(backward), None);
    }

    fn do_only(&mut self, program: &Utf8Path, args: &[&str], add: bool) {
        let forward = self.shell(program, args, !add);
        self.batch.add_cmd(Some(forward), None, None);
    }

    fn subsystem(&mut self, category: NiUpdate, program: &Utf8Path, subsystem: &str) {
        let backup = self.shell(program, &[subsystem, "backup"], false);
        let rollback = self.shell(program, &[subsystem, "rollback"], false);
        let load = self.shell(program, &[subsystem, "load"], false);
        self.batch
            .once_cmd(category, Some(backup), Some(rollback), Some(load));
    }

    /// Registers the routing-daemon backup. With `restart` set, replaces a
    /// registered save step so the daemon restarts instead.
    pub(crate) fn vty_config(&mut self, restart: bool) {
        let backup = self.shell(&self.tools.vty, &["config", "backup"], false);
        let undo = self
            .tools
            .frr_restart
            .systemctl_verb()
            .map(|verb| self.shell(&self.tools.sys, &["systemctl", verb, "frr"], false));
        let finalize = if restart { "restart" } else { "save" };
        let end = self.shell(&self.tools.vty, &["config", finalize], false);
        if restart {
            self.batch.set_cmd(NiUpdate::Vty, Some(backup), undo, Some(end));
        } else {
            self.batch.once_cmd(NiUpdate::Vty, Some(backup), undo, Some(end));
        }
    }

    /// Creates or deletes the instance container.
    pub(crate) fn container(&mut self, create: bool) {
        let lxd = &self.tools.lxd;
        let name = self.name;
        let shell = |op: &str| {
            ShellAction::new(lxd)
                .args(["container", op, name])
                .boxed()
        };
        if create {
            self.batch
                .add_cmd(Some(shell("create")), Some(shell("delete")), None);
        } else {
            self.batch.add_cmd(Some(shell("delete")), None, None);
        }
    }

    /// Initialises a freshly created container for `config`.
    pub(crate) fn container_init(&mut self, config: &InstanceConfig) -> Result<(), HandlerError> {
        let flavour = if config.route_target.is_none() {
            "std"
        } else {
            "vpn"
        };
        let role = match config.kind {
            NetworkInstanceType::DefaultInstance => "mic",
            NetworkInstanceType::L3Vrf => "ric",
            other => {
                return Err(HandlerError::Unsupported {
                    what: "network-instance type",
                    value: other.to_string(),
                });
            }
        };
        let init = ShellAction::new(&self.tools.lxcinit)
            .args([self.name.to_owned(), format!("{flavour}_{role}")])
            .boxed();
        self.batch.add_cmd(Some(init), None, None);
        Ok(())
    }

    /// Attaches or detaches a device to the container.
    pub(crate) fn container_interface(&mut self, ifname: &str, add: bool) {
        let lxd = &self.tools.lxd;
        let name = self.name;
        let shell = |op: &str| {
            ShellAction::new(lxd)
                .args(["interface", op, name, ifname])
                .boxed()
        };
        let (forward, backward) = if add {
            ("add", "delete")
        } else {
            ("delete", "add")
        };
        self.batch
            .add_cmd(Some(shell(forward)), Some(shell(backward)), None);
    }

    /// Disables reverse-path filtering on `ifname`.
    pub(crate) fn interface_sysctl(&mut self, ifname: &str, add: bool) {
        let tools = self.tools;
        self.subsystem(NiUpdate::Sysctl, &tools.sys, "sysctl");
        let key = format!("net.ipv4.conf.{}.rp_filter=0", ifname.replace('.', "/"));
        self.do_undo(&tools.sys, &["sysctl", "set", &key], add);
    }

    /// Creates or removes the VLAN device for `ifname`.
    pub(crate) fn interface_network(&mut self, ifname: &IfName, mtu: u32, add: bool) {
        let tools = self.tools;
        self.subsystem(NiUpdate::Network, &tools.sys, "network");
        let vid = ifname.index().to_string();
        let mtu_arg = mtu.to_string();
        self.do_undo(
            &tools.sys,
            &["network", "set", "vlan", ifname.device(), &vid, "--mtu", &mtu_arg],
            add,
        );
    }

    /// Sets or clears the VRF route distinguisher and target.
    pub(crate) fn vrf(&mut self, rd: &str, rt: &str, add: bool) {
        let tools = self.tools;
        self.subsystem(NiUpdate::SysVrf, &tools.sys, "vrf");
        let rd_arg = (!rd.is_empty()).then(|| format!("RD={rd}"));
        let rt_arg = (!rt.is_empty()).then(|| format!("RT={rt}"));
        let mut args = vec!["vrf", "set"];
        args.extend(rd_arg.as_deref());
        args.extend(rt_arg.as_deref());
        self.do_only(&tools.sys, &args, add);
    }

    /// Sets or clears the routing daemon's router id.
    pub(crate) fn router_id(&mut self, router_id: &str, add: bool) {
        self.vty_config(false);
        let tools = self.tools;
        self.do_only(&tools.vty, &["global", "router-id", router_id], add);
    }

    /// Sets or clears `key value` on an interface in the routing daemon. An
    /// empty `value` is left out.
    pub(crate) fn vty_interface(&mut self, ifname: &str, key: &str, value: &str, add: bool) {
        self.vty_config(false);
        let tools = self.tools;
        let mut args = vec!["interface", ifname, key];
        args.extend((!value.is_empty()).then_some(value));
        self.do_only(&tools.vty, &args, add);
    }

    /// Adds or removes a static route.
    pub(crate) fn static_route(&mut self, destination: &str, next_hop: &str, add: bool) {
        self.vty_config(false);
        let tools = self.tools;
        self.do_only(&tools.vty, &["ip", "route", destination, next_hop], add);
    }

    /// Skips the finalize pass, used once the instance itself is gone.
    pub(crate) const fn skip_finalize(&mut self) {
        self.batch.skip_finalize();
    }
}
