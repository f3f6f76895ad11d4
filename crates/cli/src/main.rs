use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use clinic_core::{
    appointment_time_from_parts, constants::DEFAULT_DATA_DIR, utc_offset_from_env_value,
    BookingData, BookingLifecycleService, BookingOverview, BookingStatus, CoreConfig,
    DirectoryService, Gender, NewPatient, NewUser, PatientData, RecordId, RecordStore, Role,
    Session, SystemClock, Transition, UserData,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic appointment system CLI")]
struct Cli {
    /// Id of the staff member running the command
    #[arg(long = "as", global = true, value_name = "USER_ID")]
    acting_as: Option<RecordId>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the first admin account (no --as needed)
    BootstrapAdmin { name: String, email: String },
    /// Create a staff account
    AddUser {
        name: String,
        email: String,
        /// admin, cs or doctor
        role: Role,
    },
    /// List staff accounts
    ListUsers {
        #[arg(long)]
        role: Option<Role>,
    },
    /// Delete a staff account and any bookings assigned to it
    DeleteUser { user_id: RecordId },
    /// Register a patient
    AddPatient {
        name: String,
        /// male or female
        gender: Gender,
        /// Date of birth (YYYY-MM-DD)
        date_of_birth: NaiveDate,
        phone_number: String,
        address: String,
    },
    /// List patients ordered by name
    ListPatients {
        /// Keep names containing this text
        #[arg(long)]
        name: Option<String>,
    },
    /// Replace a patient's details
    UpdatePatient {
        patient_id: RecordId,
        name: String,
        gender: Gender,
        date_of_birth: NaiveDate,
        phone_number: String,
        address: String,
    },
    /// Delete a patient with their bookings and medical records
    DeletePatient { patient_id: RecordId },
    /// Book a patient with a doctor
    Book {
        patient_id: RecordId,
        doctor_id: RecordId,
        /// Appointment date (YYYY-MM-DD)
        date: String,
        /// Appointment time (HH:MM)
        time: String,
    },
    /// List all bookings, latest first
    ListBookings {
        #[arg(long)]
        status: Option<BookingStatus>,
        #[arg(long)]
        doctor: Option<RecordId>,
    },
    /// Today's queue for the acting doctor
    Queue {
        #[arg(long)]
        status: Option<BookingStatus>,
    },
    /// Call the patient in
    Start { booking_id: RecordId },
    /// Finish the examination and save its medical record
    Finish {
        booking_id: RecordId,
        diagnosis: String,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Cancel an open booking
    Cancel { booking_id: RecordId },
    /// Show the recorded diagnosis and notes of a booking
    Show { booking_id: RecordId },
}

struct Clinic {
    directory: DirectoryService,
    lifecycle: BookingLifecycleService,
}

impl Clinic {
    fn from_env() -> anyhow::Result<Self> {
        let data_dir =
            std::env::var("CLINIC_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
        let utc_offset = utc_offset_from_env_value(std::env::var("CLINIC_UTC_OFFSET").ok())?;
        let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_dir), utc_offset)?);

        let store = RecordStore::open(cfg)?;
        let clock = Arc::new(SystemClock);
        Ok(Self {
            directory: DirectoryService::new(store.clone(), clock.clone()),
            lifecycle: BookingLifecycleService::new(store, clock),
        })
    }

    fn session(&self, acting_as: Option<RecordId>) -> anyhow::Result<Session> {
        let user_id = acting_as.context("this command needs --as <USER_ID>")?;
        Ok(self.directory.authenticate(&user_id.to_string())?)
    }

    fn print_bookings(&self, session: &Session, bookings: Vec<BookingData>) -> anyhow::Result<()> {
        if bookings.is_empty() {
            println!("No bookings found.");
            return Ok(());
        }
        for overview in self.lifecycle.overview(session, bookings)? {
            println!("{}", booking_line(&overview));
        }
        Ok(())
    }
}

fn booking_line(overview: &BookingOverview) -> String {
    let booking = &overview.booking;
    let name = |n: Option<&clinic_core::NonEmptyText>| {
        n.map_or_else(|| "?".to_string(), ToString::to_string)
    };
    let mut line = format!(
        "ID: {}, Time: {}, Status: {}, Patient: {}, Doctor: {}",
        booking.id,
        booking.appointment_time.format("%Y-%m-%d %H:%M"),
        booking.status,
        name(overview.patient_name.as_ref()),
        name(overview.doctor_name.as_ref()),
    );
    if let Some(diagnosis) = &overview.diagnosis {
        line.push_str(&format!(", Diagnosis: {diagnosis}"));
    }
    line
}

fn next_actions(status: BookingStatus) -> String {
    let actions = Transition::available_from(status);
    if actions.is_empty() {
        return "none".to_string();
    }
    actions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_user(user: &UserData) {
    println!(
        "ID: {}, Name: {}, Email: {}, Role: {}",
        user.id, user.name, user.email, user.role
    );
}

fn print_patient(patient: &PatientData) {
    println!(
        "ID: {}, Name: {}, Gender: {}, Born: {}, Phone: {}, Address: {}",
        patient.id,
        patient.name,
        patient.gender,
        patient.date_of_birth,
        patient.phone_number,
        patient.address
    );
}

fn print_removed(kind: &str, id: RecordId, removed: &[RecordId]) {
    println!("Deleted {kind} {id}");
    for booking_id in removed {
        println!("  removed booking {booking_id}");
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        println!("Use 'clinic --help' for commands");
        return Ok(());
    };
    let clinic = Clinic::from_env()?;

    match command {
        Commands::BootstrapAdmin { name, email } => {
            let admin = clinic.directory.bootstrap_admin(&name, &email)?;
            println!("Created admin with ID: {}", admin.id);
        }
        Commands::AddUser { name, email, role } => {
            let session = clinic.session(cli.acting_as)?;
            let user = clinic
                .directory
                .create_user(&session, NewUser { name, email, role })?;
            print_user(&user);
        }
        Commands::ListUsers { role } => {
            let session = clinic.session(cli.acting_as)?;
            let users = clinic.directory.list_users(&session, role)?;
            if users.is_empty() {
                println!("No users found.");
            }
            users.iter().for_each(print_user);
        }
        Commands::DeleteUser { user_id } => {
            let session = clinic.session(cli.acting_as)?;
            let removed = clinic.directory.delete_user(&session, user_id)?;
            print_removed("user", user_id, &removed);
        }
        Commands::AddPatient {
            name,
            gender,
            date_of_birth,
            phone_number,
            address,
        } => {
            let session = clinic.session(cli.acting_as)?;
            let patient = clinic.directory.create_patient(
                &session,
                NewPatient {
                    name,
                    gender,
                    date_of_birth,
                    phone_number,
                    address,
                },
            )?;
            print_patient(&patient);
        }
        Commands::ListPatients { name } => {
            let session = clinic.session(cli.acting_as)?;
            let patients = clinic.directory.list_patients(&session, name.as_deref())?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            patients.iter().for_each(print_patient);
        }
        Commands::UpdatePatient {
            patient_id,
            name,
            gender,
            date_of_birth,
            phone_number,
            address,
        } => {
            let session = clinic.session(cli.acting_as)?;
            let patient = clinic.directory.update_patient(
                &session,
                patient_id,
                NewPatient {
                    name,
                    gender,
                    date_of_birth,
                    phone_number,
                    address,
                },
            )?;
            print_patient(&patient);
        }
        Commands::DeletePatient { patient_id } => {
            let session = clinic.session(cli.acting_as)?;
            let removed = clinic.directory.delete_patient(&session, patient_id)?;
            print_removed("patient", patient_id, &removed);
        }
        Commands::Book {
            patient_id,
            doctor_id,
            date,
            time,
        } => {
            let session = clinic.session(cli.acting_as)?;
            let appointment_time = appointment_time_from_parts(&date, &time)?;
            let booking =
                clinic
                    .lifecycle
                    .create(&session, patient_id, doctor_id, appointment_time)?;
            clinic.print_bookings(&session, vec![booking])?;
        }
        Commands::ListBookings { status, doctor } => {
            let session = clinic.session(cli.acting_as)?;
            let bookings = clinic.lifecycle.list(&session, status, doctor)?;
            clinic.print_bookings(&session, bookings)?;
        }
        Commands::Queue { status } => {
            let session = clinic.session(cli.acting_as)?;
            println!("Queue for {}", clinic.lifecycle.today());
            let bookings = clinic.lifecycle.doctor_queue(&session, status)?;
            clinic.print_bookings(&session, bookings)?;
        }
        Commands::Start { booking_id } => {
            let session = clinic.session(cli.acting_as)?;
            let booking = clinic.lifecycle.start(&session, booking_id)?;
            clinic.print_bookings(&session, vec![booking])?;
        }
        Commands::Finish {
            booking_id,
            diagnosis,
            notes,
        } => {
            let session = clinic.session(cli.acting_as)?;
            let finished =
                clinic
                    .lifecycle
                    .finish(&session, booking_id, &diagnosis, notes.as_deref())?;
            println!("{}", finished.notification);
            println!("Medical record ID: {}", finished.record.id);
        }
        Commands::Cancel { booking_id } => {
            let session = clinic.session(cli.acting_as)?;
            let booking = clinic.lifecycle.cancel(&session, booking_id)?;
            clinic.print_bookings(&session, vec![booking])?;
        }
        Commands::Show { booking_id } => {
            let session = clinic.session(cli.acting_as)?;
            let booking = clinic.lifecycle.get(&session, booking_id)?;
            let next = next_actions(booking.status);
            clinic.print_bookings(&session, vec![booking])?;
            println!("Next: {next}");
            let detail = clinic.lifecycle.view_detail(&session, booking_id)?;
            println!("Diagnosis: {}", detail.diagnosis());
            println!("Notes: {}", detail.notes());
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run(Cli::parse())
}
