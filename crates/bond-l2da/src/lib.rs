//! L2DA bonding core.
//!
//! Steers each outbound frame of a link aggregate to the member link chosen
//! by its destination MAC address, falling back to a default link, and
//! governs which inbound frames are delivered locally or re-forwarded to
//! other members.
//!
//! # Architecture
//!
//! ```text
//!   TX path ──► L2daContext::resolve_tx / xmit ─┐
//!                                                ├─► SteeringLock<{ SteeringTable, default link }>
//!   RX path ──► L2daContext::handle_rx_frame ───┘        ▲
//!                       │                                │ write lock
//!                       └── OptionsRegistry (atomic)     │
//!   config ───► bind/unbind, set_da_link, set_default ───┴─► select_default_link
//! ```
//!
//! Member links belong to the surrounding aggregate and are referred to by
//! [`LinkId`]. The aggregate is passed into every operation as an
//! [`Aggregate`] view; [`LinkRegistry`] is an in-memory implementation.
//!
//! # Example
//!
//! ```
//! use bond_l2da::{L2daContext, LinkRegistry, TxTarget};
//! use l2da_types::{LinkState, MacAddress};
//!
//! let mut links = LinkRegistry::new();
//! let eth0 = links.add_link("eth0", LinkState::UP).unwrap();
//! let eth1 = links.add_link("eth1", LinkState::UP).unwrap();
//!
//! let ctx = L2daContext::without_notifier("bond0");
//! ctx.bind_link(&links, eth0);
//! ctx.bind_link(&links, eth1);
//!
//! let peer: MacAddress = "aa:bb:cc:dd:ee:ff".parse().unwrap();
//! ctx.set_da_link(&links, peer, eth1).unwrap();
//!
//! assert_eq!(ctx.resolve_tx(&links, peer), TxTarget::Mapped(eth1));
//! ```

mod aggregate;
mod config;
mod context;
mod error;
mod frame;
mod lock;
mod notify;
mod options;
mod registry;
mod rx;
mod selector;
mod stats;
mod table;
mod tx;

pub use aggregate::{Aggregate, LinkId, Transmitter};
pub use config::{L2daConfig, LinkConfig, MappingConfig};
pub use context::L2daContext;
pub use error::{L2daError, Result};
pub use frame::{EthernetFrame, Frame, PacketType, ETH_HLEN, ETH_P_PAE};
pub use lock::SteeringLock;
pub use notify::{L2daNotifier, NoopNotifier};
pub use options::{L2daOptions, OptionFlags, OptionsRegistry};
pub use registry::{Link, LinkRegistry};
pub use rx::RxVerdict;
pub use selector::select_default_link;
pub use stats::{L2daStats, L2daStatsSnapshot};
pub use table::{SteeringEntry, SteeringTable};
pub use tx::TxTarget;
