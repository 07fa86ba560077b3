//! Whole-car scenarios.
//!
//! Each [Car] holds the three actors of one process and routes their channels by hand, so a
//! test decides exactly when floors are reached, doors time out and snapshots cross the
//! network. Scenarios that depend on timers run the real actor tasks on paused time instead.

use std::path::PathBuf;
use tokio::sync::{mpsc, watch};
use tokio::time::{advance, Duration};

use elevfleet::backup;
use elevfleet::config;
use elevfleet::elevator_logic::{self, fsm::{Esm, EsmOutputs}};
use elevfleet::elevio::{CallButton, CallType, HardwareCommand, MotorDirection};
use elevfleet::manager::{self, Distribution, DistributionOutputs};
use elevfleet::network::local_network::{self, Replication, ReplicationEvent, ReplicationOutputs};
use elevfleet::network::PeerUpdate;
use elevfleet::world_view::{cell, set_cell, CarState, LocalQueue, MotionState, OrderStatus, EMPTY_QUEUE};


struct Car {
    identity: String,
    esm: Esm,
    distribution: Distribution,
    replication: Replication,

    hw_rx: mpsc::UnboundedReceiver<HardwareCommand>,
    state_rx: mpsc::UnboundedReceiver<elevfleet::world_view::ElevatorState>,
    completed_rx: mpsc::UnboundedReceiver<CallButton>,
    watchdog_rx: mpsc::UnboundedReceiver<()>,
    new_order_rx: mpsc::UnboundedReceiver<CallButton>,
    hall_request_rx: mpsc::UnboundedReceiver<CallButton>,
    outgoing_rx: mpsc::UnboundedReceiver<CarState>,
    replication_rx: mpsc::UnboundedReceiver<ReplicationEvent>,
    _enable_rx: watch::Receiver<bool>,

    lamps: LocalQueue,
    motor: MotorDirection,
    commands: Vec<HardwareCommand>,
    served: Vec<CallButton>,
    injected: Vec<CallButton>,
}

impl Car {
    fn new(identity: &str, floor: u8, backup_path: Option<PathBuf>) -> Self {
        let (hw_tx, hw_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = mpsc::unbounded_channel();
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        let (watchdog_tx, watchdog_rx) = mpsc::unbounded_channel();
        let (new_order_tx, new_order_rx) = mpsc::unbounded_channel();
        let (hall_request_tx, hall_request_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (distribution_tx, replication_rx) = mpsc::unbounded_channel();
        let (enable_tx, enable_rx) = watch::channel(false);

        let esm = Esm::new(
            floor,
            EsmOutputs { hw_tx: hw_tx.clone(), state_tx, completed_tx, watchdog_tx },
            backup_path,
        );
        let distribution = Distribution::new(DistributionOutputs { hw_tx, new_order_tx, hall_request_tx });
        let replication = Replication::new(
            identity,
            ReplicationOutputs { outgoing_tx, distribution_tx, enable_tx },
        );

        let mut car = Car {
            identity: identity.to_string(),
            esm,
            distribution,
            replication,
            hw_rx,
            state_rx,
            completed_rx,
            watchdog_rx,
            new_order_rx,
            hall_request_rx,
            outgoing_rx,
            replication_rx,
            _enable_rx: enable_rx,
            lamps: EMPTY_QUEUE,
            motor: MotorDirection::Stop,
            commands: Vec::new(),
            served: Vec::new(),
            injected: Vec::new(),
        };
        car.esm.restore_backup();
        car.pump();
        car
    }

    /// Delivers queued messages until every channel is empty
    fn pump(&mut self) {
        loop {
            if let Ok(event) = self.replication_rx.try_recv() {
                self.distribution.on_replication_event(event);
            } else if let Ok(elevator) = self.state_rx.try_recv() {
                self.replication.on_local_snapshot(elevator);
            } else if let Ok(call) = self.completed_rx.try_recv() {
                self.served.push(call);
                self.replication.on_order_completed(call);
            } else if let Ok(call) = self.hall_request_rx.try_recv() {
                self.replication.on_new_hall_request(call);
            } else if let Ok(call) = self.new_order_rx.try_recv() {
                self.injected.push(call);
                self.esm.on_new_order(call);
            } else if self.watchdog_rx.try_recv().is_ok() {
                self.distribution.on_watchdog_timeout();
            } else if let Ok(cmd) = self.hw_rx.try_recv() {
                match cmd {
                    HardwareCommand::SetButtonLamp(call, on) => set_cell(&mut self.lamps, call, on),
                    HardwareCommand::SetMotor(dirn) => self.motor = dirn,
                    _ => {}
                }
                self.commands.push(cmd);
            } else {
                break;
            }
        }
    }

    fn press(&mut self, call: CallButton) {
        self.distribution.on_button_pressed(call);
        self.pump();
    }

    fn arrive(&mut self, floor: u8) {
        self.esm.on_floor_arrival(floor);
        self.pump();
    }

    fn door_timeout(&mut self) {
        self.esm.on_door_timeout();
        self.pump();
    }

    /// Feeds floor arrivals in the direction of the motor until `floor` is reached
    fn ride_to(&mut self, floor: u8) {
        for _ in 0..config::NUM_FLOORS {
            let here = self.esm.elevator().floor;
            if here == floor {
                break;
            }
            let next = match self.motor {
                MotorDirection::Up => here + 1,
                MotorDirection::Down => here - 1,
                MotorDirection::Stop => break,
            };
            self.arrive(next);
        }
    }

    fn broadcast(&mut self) -> CarState {
        self.replication.on_broadcast_tick();
        self.outgoing_rx.try_recv().unwrap()
    }

    fn hear(&mut self, state: CarState) {
        self.replication.on_incoming_snapshot(state);
        self.pump();
    }

    fn peer_joined(&mut self, identity: &str) {
        self.replication.on_peer_update(PeerUpdate {
            peers: vec![identity.to_string()],
            new: Some(identity.to_string()),
            lost: vec![],
        });
        self.pump();
    }

    fn status(&self, call: CallButton) -> OrderStatus {
        cell(&self.replication.world_view().mine().order_status, call)
    }

    fn lamp(&self, call: CallButton) -> bool {
        cell(&self.lamps, call)
    }
}

fn meet_all(cars: &mut [Car]) {
    let identities: Vec<String> = cars.iter().map(|car| car.identity.clone()).collect();
    for car in cars.iter_mut() {
        let own_identity = car.identity.clone();
        for identity in identities.iter().filter(|id| **id != own_identity) {
            car.peer_joined(identity);
        }
    }
}

/// One car running as its real actor tasks, wired the way the binary wires them
struct LiveCar {
    floor_tx: mpsc::UnboundedSender<u8>,
    peer_update_tx: mpsc::UnboundedSender<PeerUpdate>,
    incoming_tx: mpsc::UnboundedSender<CarState>,
    hw_rx: mpsc::UnboundedReceiver<HardwareCommand>,
    outgoing_rx: mpsc::UnboundedReceiver<CarState>,
    _enable_rx: watch::Receiver<bool>,
    commands: Vec<HardwareCommand>,
}

impl LiveCar {
    fn spawn(identity: &str, floor: u8) -> Self {
        let mpscs = local_network::Mpscs::new();
        let (_button_tx, button_rx) = mpsc::unbounded_channel();
        let (floor_tx, floor_rx) = mpsc::unbounded_channel();
        let (new_order_tx, new_order_rx) = mpsc::unbounded_channel();
        let (watchdog_tx, watchdog_rx) = mpsc::unbounded_channel();
        let (distribution_tx, replication_rx) = mpsc::unbounded_channel();
        let (hw_tx, hw_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (enable_tx, enable_rx) = watch::channel(false);

        let car = LiveCar {
            floor_tx,
            peer_update_tx: mpscs.txs.peer_update.clone(),
            incoming_tx: mpscs.txs.incoming_snapshot.clone(),
            hw_rx,
            outgoing_rx,
            _enable_rx: enable_rx,
            commands: Vec::new(),
        };
        let esm_out = EsmOutputs {
            hw_tx: hw_tx.clone(),
            state_tx: mpscs.txs.local_elevator.clone(),
            completed_tx: mpscs.txs.order_completed.clone(),
            watchdog_tx,
        };
        let dist_out = DistributionOutputs { hw_tx, new_order_tx, hall_request_tx: mpscs.txs.hall_request.clone() };
        let repl_out = ReplicationOutputs { outgoing_tx, distribution_tx, enable_tx };

        tokio::spawn(local_network::run_replication(identity.to_string(), mpscs.rxs, repl_out));
        tokio::spawn(manager::run_distribution(button_rx, replication_rx, watchdog_rx, dist_out));
        tokio::spawn(elevator_logic::run_local_elevator(floor, None, new_order_rx, floor_rx, esm_out));
        car
    }

    fn collect_commands(&mut self) -> &[HardwareCommand] {
        while let Ok(cmd) = self.hw_rx.try_recv() {
            self.commands.push(cmd);
        }
        &self.commands
    }

    fn last_broadcast(&mut self) -> Option<CarState> {
        let mut last = None;
        while let Ok(state) = self.outgoing_rx.try_recv() {
            last = Some(state);
        }
        last
    }
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Every car broadcasts once and hears everyone, `rounds` times
fn gossip(cars: &mut [Car], rounds: usize) {
    for _ in 0..rounds {
        let states: Vec<CarState> = cars.iter_mut().map(Car::broadcast).collect();
        for car in cars.iter_mut() {
            for state in &states {
                car.hear(state.clone());
            }
        }
    }
}


#[tokio::test]
async fn lone_car_serves_hall_call_and_goes_idle() {
    let mut car = Car::new("peer-a", 0, None);
    let call = CallButton::new(CallType::HallUp, 2);

    car.press(call);
    assert!(car.lamp(call));
    assert_eq!(car.injected, vec![call]);
    assert_eq!(car.esm.elevator().motion, MotionState::Moving);
    assert_eq!(car.motor, MotorDirection::Up);

    car.ride_to(2);
    assert_eq!(car.esm.elevator().motion, MotionState::DoorOpen);
    assert_eq!(car.motor, MotorDirection::Stop);
    assert_eq!(car.served, vec![call]);
    assert!(!car.lamp(call));
    assert_eq!(car.status(call), OrderStatus::None);
    assert!(!car.distribution.table().is_marked(call));

    car.door_timeout();
    assert_eq!(car.esm.elevator().motion, MotionState::Idle);
    assert_eq!(car.esm.elevator().local_queue, EMPTY_QUEUE);
    assert_eq!(car.commands.last(), Some(&HardwareCommand::SetDoorLamp(false)));
}

#[tokio::test]
async fn closest_idle_car_takes_the_call() {
    let mut cars = vec![Car::new("peer-a", 0, None), Car::new("peer-b", 3, None)];
    meet_all(&mut cars);
    let call = CallButton::new(CallType::HallDown, 3);

    cars[0].press(call);
    gossip(&mut cars, 4);

    assert!(cars[0].injected.is_empty());
    assert!(!cars[0].commands.contains(&HardwareCommand::SetMotor(MotorDirection::Up)));
    assert_eq!(cars[1].injected, vec![call]);
    assert_eq!(cars[1].served, vec![call]);
    for car in &cars {
        assert_eq!(car.status(call), OrderStatus::None);
        assert!(!car.lamp(call));
    }
}

#[tokio::test(start_paused = true)]
async fn lone_survivor_serves_and_clears_call_of_lost_peer() {
    let mut a = LiveCar::spawn("peer-a", 0);
    let mut b = Car::new("peer-b", 1, None);
    settle().await;
    a.peer_update_tx
        .send(PeerUpdate { peers: vec!["peer-b".to_string()], new: Some("peer-b".to_string()), lost: vec![] })
        .unwrap();
    b.peer_joined("peer-a");
    let call = CallButton::new(CallType::HallDown, 3);

    // B requests the call and A acknowledges it, but B never hears A back
    b.press(call);
    a.incoming_tx.send(b.broadcast()).unwrap();
    settle().await;
    assert!(a.collect_commands().contains(&HardwareCommand::SetButtonLamp(call, true)));
    assert!(!a.commands.contains(&HardwareCommand::SetMotor(MotorDirection::Up)));

    a.peer_update_tx.send(PeerUpdate { peers: vec![], new: None, lost: vec!["peer-b".to_string()] }).unwrap();
    settle().await;
    assert!(!a.collect_commands().contains(&HardwareCommand::SetMotor(MotorDirection::Up)));

    // Nothing but time passing makes A take the call over
    advance(config::WATCHDOG_TIMER_DURATION + Duration::from_millis(10)).await;
    settle().await;
    assert!(a.collect_commands().contains(&HardwareCommand::SetMotor(MotorDirection::Up)));

    for floor in 1..=3 {
        a.floor_tx.send(floor).unwrap();
    }
    settle().await;
    assert!(a.collect_commands().contains(&HardwareCommand::SetButtonLamp(call, false)));

    advance(config::BROADCAST_PERIOD).await;
    settle().await;
    let state = a.last_broadcast().unwrap();
    assert_eq!(cell(&state.order_status, call), OrderStatus::None);
}

#[tokio::test]
async fn restart_reinjects_cab_call_from_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("order_backup.txt");
    let call = CallButton::new(CallType::Cab, 1);
    let mut queue = EMPTY_QUEUE;
    set_cell(&mut queue, call, true);
    backup::write_backup(&path, &queue).unwrap();

    let mut car = Car::new("peer-a", 0, Some(path.clone()));
    assert!(car.lamp(call));
    assert_eq!(car.motor, MotorDirection::Up);

    car.ride_to(1);
    assert_eq!(car.served, vec![call]);
    assert!(!car.lamp(call));
    assert_eq!(backup::read_backup(&path).unwrap(), EMPTY_QUEUE);
}

#[tokio::test]
async fn three_cars_agree_on_every_hall_call() {
    let mut cars = vec![
        Car::new("peer-a", 0, None),
        Car::new("peer-b", 0, None),
        Car::new("peer-c", 0, None),
    ];
    meet_all(&mut cars);
    let calls = [
        CallButton::new(CallType::HallUp, 1),
        CallButton::new(CallType::HallDown, 2),
        CallButton::new(CallType::HallDown, 3),
    ];
    for (car, call) in cars.iter_mut().zip(calls) {
        car.press(call);
    }
    gossip(&mut cars, 4);

    for call in calls {
        for car in &cars {
            assert_eq!(car.status(call), OrderStatus::Requested, "{} on {:?}", car.identity, call);
            assert!(car.lamp(call));
            assert!(car.distribution.table().is_marked(call));
        }
        assert!(cars.iter().any(|car| cell(&car.esm.elevator().local_queue, call)));
    }
}

#[tokio::test]
async fn cab_call_stays_local() {
    let mut cars = vec![Car::new("peer-a", 0, None), Car::new("peer-b", 3, None)];
    meet_all(&mut cars);
    let call = CallButton::new(CallType::Cab, 2);

    cars[1].press(call);
    gossip(&mut cars, 2);

    assert_eq!(cars[1].injected, vec![call]);
    assert!(cars[0].injected.is_empty());
    assert!(!cars[0].lamp(call));
    assert!(cars.iter().all(|car| car.status(call) == OrderStatus::None));
}
