//! End-to-end steering scenarios against a recording wire.
//!
//! These tests drive the context the way a bonding driver would: links are
//! added to a registry and bound, link events are replayed, and every frame
//! the context hands to the transmitter is captured.

use std::sync::{Arc, Mutex};
use std::thread;

use bond_l2da::{
    Aggregate, EthernetFrame, L2daContext, L2daNotifier, L2daOptions, LinkId, LinkRegistry,
    RxVerdict, Transmitter, TxTarget,
};
use l2da_types::{AdminState, LinkState, MacAddress, OperState};
use pretty_assertions::assert_eq;

/// Where the wire saw a frame go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEvent {
    Queued { link: LinkId, dst: MacAddress },
    AllLinks { dst: MacAddress },
}

/// Mock transmit primitive that records instead of sending.
#[derive(Default)]
pub struct MockWire {
    events: Arc<Mutex<Vec<WireEvent>>>,
}

impl MockWire {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<WireEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_on(&self, link: LinkId) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, WireEvent::Queued { link: l, .. } if *l == link))
            .count()
    }
}

impl Transmitter<EthernetFrame> for MockWire {
    fn queue_xmit(&self, link: LinkId, frame: EthernetFrame) {
        use bond_l2da::Frame;
        let dst = frame.destination();
        self.events.lock().unwrap().push(WireEvent::Queued { link, dst });
    }

    fn xmit_all(&self, frame: EthernetFrame) {
        use bond_l2da::Frame;
        let dst = frame.destination();
        self.events.lock().unwrap().push(WireEvent::AllLinks { dst });
    }
}

/// Notifier recording every callback.
#[derive(Default)]
pub struct MockNotifier {
    removed: Mutex<Vec<MacAddress>>,
    departed: Mutex<Vec<LinkId>>,
}

impl L2daNotifier for MockNotifier {
    fn mapping_removed(&self, da: MacAddress) {
        self.removed.lock().unwrap().push(da);
    }

    fn default_link_departed(&self, previous: LinkId) {
        self.departed.lock().unwrap().push(previous);
    }
}

struct Bond {
    links: LinkRegistry,
    ctx: L2daContext,
    notifier: Arc<MockNotifier>,
}

impl Bond {
    fn new(names: &[&str]) -> Self {
        let notifier = Arc::new(MockNotifier::default());
        let ctx = L2daContext::new("bond0", notifier.clone());
        let mut links = LinkRegistry::new();
        for name in names {
            let id = links.add_link(name, LinkState::UP).unwrap();
            ctx.bind_link(&links, id);
        }
        Self {
            links,
            ctx,
            notifier,
        }
    }

    fn link(&self, name: &str) -> LinkId {
        self.links.link_by_name(name).unwrap()
    }

    fn set_oper(&mut self, name: &str, oper: OperState) {
        let id = self.link(name);
        self.links
            .set_state(id, LinkState::UP.with_oper(oper))
            .unwrap();
        self.ctx.handle_link_change(&self.links, id);
    }

    fn detach(&mut self, name: &str) {
        let id = self.link(name);
        self.ctx.unbind_link(&self.links, id);
        self.links.remove_link(id).unwrap();
    }
}

fn mac(s: &str) -> MacAddress {
    s.parse().unwrap()
}

fn unicast(src: &str, dst: &str) -> EthernetFrame {
    EthernetFrame::build(mac(dst), mac(src), 0x0800, b"payload")
}

const PEER: &str = "aa:bb:cc:dd:ee:ff";
const HOST: &str = "02:00:00:00:00:01";
const MCAST: &str = "01:00:5e:00:00:fb";

#[test]
fn test_first_bound_link_is_default() {
    let bond = Bond::new(&["eth0", "eth1"]);
    assert_eq!(bond.ctx.default_link(), Some(bond.link("eth0")));
    assert_eq!(bond.ctx.default_link_name(&bond.links).as_deref(), Some("eth0"));
}

#[test]
fn test_mapped_link_down_falls_back_to_default() {
    let mut bond = Bond::new(&["eth0", "eth1"]);
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");
    bond.ctx.set_da_link(&bond.links, mac(PEER), eth1).unwrap();
    assert_eq!(bond.ctx.resolve_tx(&bond.links, mac(PEER)), TxTarget::Mapped(eth1));

    bond.set_oper("eth1", OperState::Down);
    assert_eq!(bond.ctx.resolve_tx(&bond.links, mac(PEER)), TxTarget::Default(eth0));

    // Mapping survives the outage and is used again once the link recovers.
    bond.set_oper("eth1", OperState::Up);
    assert_eq!(bond.ctx.resolve_tx(&bond.links, mac(PEER)), TxTarget::Mapped(eth1));
}

#[test]
fn test_default_follows_link_failures() {
    let mut bond = Bond::new(&["eth0", "eth1", "eth2"]);
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");

    bond.set_oper("eth0", OperState::Fail);
    assert_eq!(bond.ctx.default_link(), Some(eth1));

    // eth0 recovering does not steal the default back.
    bond.set_oper("eth0", OperState::Up);
    assert_eq!(bond.ctx.default_link(), Some(eth1));

    bond.set_oper("eth1", OperState::Down);
    assert_eq!(bond.ctx.default_link(), Some(eth0));

    assert_eq!(*bond.notifier.departed.lock().unwrap(), vec![eth0, eth1]);
}

#[test]
fn test_no_capable_link_drops_and_clears_default() {
    let mut bond = Bond::new(&["eth0", "eth1"]);
    let wire = MockWire::new();

    bond.set_oper("eth0", OperState::Down);
    bond.set_oper("eth1", OperState::Down);
    assert_eq!(bond.ctx.default_link(), None);

    let mut buf = [0u8; 16];
    assert_eq!(bond.ctx.copy_default_link_name(&bond.links, &mut buf).unwrap(), 0);

    assert_eq!(bond.ctx.xmit(&bond.links, &wire, unicast(HOST, PEER)), TxTarget::Drop);
    assert!(wire.events().is_empty());
    assert_eq!(bond.ctx.stats().tx_dropped, 1);

    bond.set_oper("eth1", OperState::Back);
    assert_eq!(bond.ctx.default_link(), None);
    bond.set_oper("eth1", OperState::Up);
    assert_eq!(bond.ctx.default_link(), Some(bond.link("eth1")));
}

#[test]
fn test_admin_down_link_is_not_selected() {
    let mut bond = Bond::new(&["eth0", "eth1"]);
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");

    bond.links
        .set_state(eth0, LinkState::new(AdminState::Down, OperState::Up, true))
        .unwrap();
    bond.ctx.handle_link_change(&bond.links, eth0);
    assert_eq!(bond.ctx.default_link(), Some(eth1));

    assert!(bond.ctx.set_default_link(&bond.links, eth0).is_err());
    assert_eq!(bond.ctx.default_link(), Some(eth1));
}

#[test]
fn test_detach_purges_link_mappings() {
    let mut bond = Bond::new(&["eth0", "eth1"]);
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");
    bond.ctx.set_da_link(&bond.links, mac(PEER), eth0).unwrap();
    bond.ctx.set_da_link(&bond.links, mac(HOST), eth1).unwrap();

    bond.detach("eth0");

    assert_eq!(bond.ctx.default_link(), Some(eth1));
    assert_eq!(bond.ctx.lookup(mac(PEER)), None);
    assert_eq!(bond.ctx.lookup(mac(HOST)), Some(eth1));
    assert_eq!(*bond.notifier.removed.lock().unwrap(), vec![mac(PEER)]);
    assert_eq!(bond.ctx.resolve_tx(&bond.links, mac(PEER)), TxTarget::Default(eth1));
}

#[test]
fn test_multicast_duplication_on_transmit() {
    let bond = Bond::new(&["eth0", "eth1"]);
    let wire = MockWire::new();
    let frame = || unicast(HOST, MCAST);

    assert_eq!(
        bond.ctx.xmit(&bond.links, &wire, frame()),
        TxTarget::Default(bond.link("eth0"))
    );

    bond.ctx.set_opts(L2daOptions::DUP_MC_TX);
    assert_eq!(bond.ctx.xmit(&bond.links, &wire, frame()), TxTarget::AllLinks);
    assert_eq!(
        wire.events().last(),
        Some(&WireEvent::AllLinks { dst: mac(MCAST) })
    );
}

#[test]
fn test_dedup_admission_per_source_mapping() {
    let bond = Bond::new(&["eth0", "eth1"]);
    let wire = MockWire::new();
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");

    // Dedup off: accepted everywhere.
    for link in [eth0, eth1] {
        assert!(bond
            .ctx
            .handle_rx_frame(&bond.links, &wire, link, &unicast(PEER, HOST))
            .deliver_locally());
    }

    bond.ctx.set_opts(L2daOptions::DEDUP_RX);
    bond.ctx.set_da_link(&bond.links, mac(PEER), eth1).unwrap();
    assert_eq!(
        bond.ctx.handle_rx_frame(&bond.links, &wire, eth1, &unicast(PEER, HOST)),
        RxVerdict::Deliver { forwarded: 0 }
    );
    assert_eq!(
        bond.ctx.handle_rx_frame(&bond.links, &wire, eth0, &unicast(PEER, HOST)),
        RxVerdict::Reject
    );
}

#[test]
fn test_bridging_between_members() {
    let bond = Bond::new(&["eth0", "eth1", "eth2"]);
    let wire = MockWire::new();
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");
    let eth2 = bond.link("eth2");
    bond.ctx.set_opts(L2daOptions::FORWARD_RX | L2daOptions::DEDUP_RX);
    bond.ctx.set_da_link(&bond.links, mac(PEER), eth2).unwrap();

    // Multicast from the default link floods to the other two.
    let verdict = bond
        .ctx
        .handle_rx_frame(&bond.links, &wire, eth0, &unicast(HOST, MCAST));
    assert_eq!(verdict, RxVerdict::Deliver { forwarded: 2 });
    assert_eq!(wire.count_on(eth1), 1);
    assert_eq!(wire.count_on(eth2), 1);

    // Unicast towards a peer mapped on eth2 is handed to eth2 only.
    let verdict = bond
        .ctx
        .handle_rx_frame(&bond.links, &wire, eth0, &unicast(HOST, PEER));
    assert_eq!(verdict, RxVerdict::Consumed(eth2));
    assert_eq!(wire.count_on(eth2), 2);
    assert_eq!(wire.count_on(eth1), 1);

    // Same frame from a non-default link fails dedup and goes nowhere.
    let verdict = bond
        .ctx
        .handle_rx_frame(&bond.links, &wire, eth1, &unicast(HOST, PEER));
    assert_eq!(verdict, RxVerdict::Reject);
    assert_eq!(wire.events().len(), 3);

    let stats = bond.ctx.stats();
    assert_eq!(stats.rx_forwarded, 3);
    assert_eq!(stats.rx_rejected, 1);
}

#[test]
fn test_deinitialize_notifies_every_mapping() {
    let bond = Bond::new(&["eth0", "eth1"]);
    let eth1 = bond.link("eth1");
    for i in 0..20u8 {
        let da = MacAddress::new([0x02, 0, 0, 0, i, i]);
        bond.ctx.set_da_link(&bond.links, da, eth1).unwrap();
    }

    let notifier = bond.notifier.clone();
    bond.ctx.deinitialize();
    assert_eq!(notifier.removed.lock().unwrap().len(), 20);
}

#[test]
fn test_concurrent_resolution_during_updates() {
    let bond = Arc::new(Bond::new(&["eth0", "eth1"]));
    let eth0 = bond.link("eth0");
    let eth1 = bond.link("eth1");
    let peer = mac(PEER);

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let bond = Arc::clone(&bond);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let link = bond.ctx.tx_link_for(&bond.links, peer);
                    assert!(link == Some(eth0) || link == Some(eth1));
                }
            })
        })
        .collect();

    for i in 0..500 {
        let link = if i % 2 == 0 { eth1 } else { eth0 };
        bond.ctx.set_da_link(&bond.links, peer, link).unwrap();
        if i % 7 == 0 {
            let _ = bond.ctx.del_da(peer);
        }
    }

    for reader in readers {
        reader.join().unwrap();
    }
    assert!(bond.ctx.mapping_count() <= 1);
}
