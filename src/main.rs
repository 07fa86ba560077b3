use std::path::PathBuf;
use tokio::sync::mpsc;

use elevfleet::elevio::{self, elev, HardwareCommand, HardwareEvent};
use elevfleet::elevator_logic::{self, fsm::EsmOutputs};
use elevfleet::manager::{self, DistributionOutputs};
use elevfleet::network::{self, local_network};
use elevfleet::{config, init, print};


/// Moves everything from `rx` over to `tx` until either side closes
async fn forward<T>(mut rx: mpsc::UnboundedReceiver<T>, tx: mpsc::UnboundedSender<T>) {
    while let Some(value) = rx.recv().await {
        if tx.send(value).is_err() {
            break;
        }
    }
}

fn apply_or_log(elevator: &elev::Elevator, cmd: HardwareCommand) {
    if let Err(e) = elevio::apply_command(elevator, cmd) {
        print::err(format!("Shutdown command {:?} failed: {:#}", cmd, e));
    }
}

/// Stops the car and blinks the stop lamp. Runs on the driver directly, bypassing the actors.
fn safety_shutdown(elevator: &elev::Elevator) {
    for step in 0..config::SHUTDOWN_BLINKS {
        for cmd in elevio::shutdown_blink(step) {
            apply_or_log(elevator, cmd);
        }
        std::thread::sleep(config::SHUTDOWN_BLINK_PERIOD);
    }
    apply_or_log(elevator, HardwareCommand::SetStopLamp(false));
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = init::parse_args();
    init::apply_print_flags(&args);
    let identity = init::derive_identity(&args);
    print::info(format!("Starting car {}", identity));

    let sim_addr = format!("{}:{}", config::SIM_HOST, args.port);
    let elevio::Hardware { elevator, init_floor, mut events_rx, commands_tx } = elevio::start_hardware(&sim_addr)?;
    let transport = network::start_transport(&identity)?;


    /* START ----------- Init of channels between the actors ---------------------- */
    let main_mpscs = local_network::Mpscs::new();
    let mpsc_rxs = main_mpscs.rxs;
    let mpsc_txs = main_mpscs.txs;

    let (button_tx, button_rx) = mpsc::unbounded_channel();
    let (floor_tx, floor_rx) = mpsc::unbounded_channel();
    let (new_order_tx, new_order_rx) = mpsc::unbounded_channel();
    let (watchdog_tx, watchdog_rx) = mpsc::unbounded_channel();
    let (distribution_tx, replication_rx) = mpsc::unbounded_channel();
    /* SLUTT ----------- Init of channels between the actors ---------------------- */


    /* START ----------- Routing of inputs ---------------------- */
    tokio::spawn(forward(transport.peer_update_rx, mpsc_txs.peer_update.clone()));
    tokio::spawn(forward(transport.incoming_rx, mpsc_txs.incoming_snapshot.clone()));

    // Button presses go to distribution, floor arrivals to the local elevator
    {
        let _hardware_router_task = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                let delivered = match event {
                    HardwareEvent::ButtonPressed(call) => button_tx.send(call).is_ok(),
                    HardwareEvent::FloorArrived(floor) => floor_tx.send(floor).is_ok(),
                };
                if !delivered {
                    print::warn(format!("Hardware event {:?} dropped", event));
                }
            }
        });
    }
    /* SLUTT ----------- Routing of inputs ---------------------- */


    /* START ----------- Critical tasks ----------- */
    {
        let outputs = local_network::ReplicationOutputs {
            outgoing_tx: transport.outgoing_tx,
            distribution_tx,
            enable_tx: transport.enable_tx,
        };
        let identity = identity.clone();
        let _replication_task = tokio::spawn(async move {
            print::info("Starting replication".to_string());
            local_network::run_replication(identity, mpsc_rxs, outputs).await;
        });
    }
    {
        let outputs = DistributionOutputs {
            hw_tx: commands_tx.clone(),
            new_order_tx,
            hall_request_tx: mpsc_txs.hall_request.clone(),
        };
        let _distribution_task = tokio::spawn(async move {
            print::info("Starting distribution".to_string());
            manager::run_distribution(button_rx, replication_rx, watchdog_rx, outputs).await;
        });
    }
    {
        let outputs = EsmOutputs {
            hw_tx: commands_tx,
            state_tx: mpsc_txs.local_elevator.clone(),
            completed_tx: mpsc_txs.order_completed.clone(),
            watchdog_tx,
        };
        let backup_path = PathBuf::from(config::BACKUP_FILE_PATH);
        let _local_elev_task = tokio::spawn(async move {
            print::info("Starting local elevator".to_string());
            elevator_logic::run_local_elevator(init_floor, Some(backup_path), new_order_rx, floor_rx, outputs).await;
        });
    }
    /* SLUTT ----------- Critical tasks ----------- */


    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            print::warn("Interrupted, stopping the car".to_string());
            safety_shutdown(&elevator);
            std::process::exit(1);
        }
        Err(e) => {
            print::err(format!("Could not listen for ctrl-c: {}", e));
            std::future::pending::<()>().await;
        }
    }
    Ok(())
}
