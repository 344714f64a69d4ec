//! Named daemon methods
//!
//! Thin wrappers over [`LightningClient::invoke`]: each sends its arguments
//! positionally, in the order the daemon expects, and returns the raw
//! `result`. Optional arguments are sent as `null`.

use crate::LightningClient;
use lnrpc_core::Result;
use serde_json::{json, Value};

impl LightningClient {
    /// `dev-blockheight`
    pub async fn dev_blockheight(&self) -> Result<Value> {
        self.invoke("dev-blockheight", vec![]).await
    }

    /// List the nodes known from gossip
    pub async fn getnodes(&self) -> Result<Value> {
        self.invoke("getnodes", vec![]).await
    }

    /// Find a route to node `id` for `msatoshi`
    pub async fn getroute(&self, id: &str, msatoshi: u64, riskfactor: f64) -> Result<Value> {
        self.invoke("getroute", vec![json!(id), json!(msatoshi), json!(riskfactor)]).await
    }

    /// List the channels known from gossip
    pub async fn getchannels(&self) -> Result<Value> {
        self.invoke("getchannels", vec![]).await
    }

    /// Create an invoice for `msatoshi` under `label`
    ///
    /// `preimage` fixes the payment preimage; the daemon picks one if `None`.
    pub async fn invoice(
        &self,
        msatoshi: u64,
        label: &str,
        preimage: Option<&str>,
    ) -> Result<Value> {
        self.invoke("invoice", vec![json!(msatoshi), json!(label), json!(preimage)]).await
    }

    /// Show one invoice, or all of them if `label` is `None`
    pub async fn listinvoice(&self, label: Option<&str>) -> Result<Value> {
        self.invoke("listinvoice", vec![json!(label)]).await
    }

    /// Delete an unpaid invoice
    pub async fn delinvoice(&self, label: Option<&str>) -> Result<Value> {
        self.invoke("delinvoice", vec![json!(label)]).await
    }

    /// Wait for the next invoice paid after `label`
    pub async fn waitanyinvoice(&self, label: Option<&str>) -> Result<Value> {
        self.invoke("waitanyinvoice", vec![json!(label)]).await
    }

    /// Wait for the invoice `label` to be paid
    pub async fn waitinvoice(&self, label: &str) -> Result<Value> {
        self.invoke("waitinvoice", vec![json!(label)]).await
    }

    /// Commands the daemon knows, with a one-line description each
    pub async fn help(&self) -> Result<Value> {
        self.invoke("help", vec![]).await
    }

    /// Ask the daemon to shut down
    pub async fn stop(&self) -> Result<Value> {
        self.invoke("stop", vec![]).await
    }

    /// Fetch the daemon log, optionally filtered by `level`
    pub async fn getlog(&self, level: Option<&str>) -> Result<Value> {
        self.invoke("getlog", vec![json!(level)]).await
    }

    /// `dev-rhash`: hash of `secret`
    pub async fn dev_rhash(&self, secret: &str) -> Result<Value> {
        self.invoke("dev-rhash", vec![json!(secret)]).await
    }

    /// `dev-crash`
    pub async fn dev_crash(&self) -> Result<Value> {
        self.invoke("dev-crash", vec![]).await
    }

    /// Node id, version, block height and network summary
    pub async fn getinfo(&self) -> Result<Value> {
        self.invoke("getinfo", vec![]).await
    }

    /// Send a payment along `route` for the payment hash `rhash`
    pub async fn sendpay(&self, route: Value, rhash: &str) -> Result<Value> {
        self.invoke("sendpay", vec![route, json!(rhash)]).await
    }

    /// Connect to the peer `id` at `host:port`
    pub async fn connect(&self, host: &str, port: u16, id: &str) -> Result<Value> {
        self.invoke("connect", vec![json!(host), json!(port), json!(id)]).await
    }

    /// `dev-fail`: fail the channel with peer `id`
    pub async fn dev_fail(&self, id: &str) -> Result<Value> {
        self.invoke("dev-fail", vec![json!(id)]).await
    }

    /// List connected peers, with logs at `level` if given
    pub async fn getpeers(&self, level: Option<&str>) -> Result<Value> {
        self.invoke("getpeers", vec![json!(level)]).await
    }

    /// Open a channel to peer `id` funded with `satoshis`
    pub async fn fundchannel(&self, id: &str, satoshis: u64) -> Result<Value> {
        self.invoke("fundchannel", vec![json!(id), json!(satoshis)]).await
    }

    /// Close the channel with peer `id`
    pub async fn close(&self, id: &str) -> Result<Value> {
        self.invoke("close", vec![json!(id)]).await
    }

    /// `dev-ping`: ping `peerid` with a `len` byte payload
    pub async fn dev_ping(&self, peerid: &str, len: u32, pongbytes: u32) -> Result<Value> {
        self.invoke("dev-ping", vec![json!(peerid), json!(len), json!(pongbytes)]).await
    }

    /// Send `satoshi` from the internal wallet to `destination`
    ///
    /// The daemon takes the amount first, so the arguments go out as
    /// `[satoshi, destination]`.
    pub async fn withdraw(&self, destination: &str, satoshi: u64) -> Result<Value> {
        self.invoke("withdraw", vec![json!(satoshi), json!(destination)]).await
    }

    /// Get a fresh wallet address
    pub async fn newaddr(&self) -> Result<Value> {
        self.invoke("newaddr", vec![]).await
    }

    /// Add the outputs of the raw transaction `tx` to the wallet
    pub async fn addfunds(&self, tx: &str) -> Result<Value> {
        self.invoke("addfunds", vec![json!(tx)]).await
    }

    /// List wallet outputs
    pub async fn listfunds(&self) -> Result<Value> {
        self.invoke("listfunds", vec![]).await
    }
}
