use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{FieldName, FormDraft, SpeciesStore};
use shared::{
    domain::{Species, SpeciesFields, SpeciesId, UserId},
    error::{ApiException, ErrorCode},
    protocol::OwnerScope,
};
use storage::Storage;

#[derive(Parser, Debug)]
#[command(about = "Admin commands for the species catalog database")]
struct Cli {
    #[arg(long, env = "SPECIES_DATABASE_URL", default_value = "sqlite://./data/species.db")]
    database_url: String,
    /// Print records as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Add {
        #[arg(long)]
        owner: i64,
        scientific_name: String,
        #[arg(long)]
        common_name: Option<String>,
        #[arg(long, default_value = "Animalia")]
        kingdom: String,
        #[arg(long)]
        population: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        image: Option<String>,
    },
    List {
        #[arg(long)]
        owner: Option<i64>,
    },
    Show {
        id: i64,
    },
    /// Deletes a species; the owner must match.
    Delete {
        id: i64,
        #[arg(long)]
        owner: i64,
    },
    /// Inserts a handful of sample species owned by `owner`.
    Seed {
        #[arg(long, default_value_t = 1)]
        owner: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Add {
            owner,
            scientific_name,
            common_name,
            kingdom,
            population,
            description,
            image,
        } => {
            let fields = validated_fields(&[
                (FieldName::ScientificName, Some(scientific_name)),
                (FieldName::CommonName, common_name),
                (FieldName::Kingdom, Some(kingdom)),
                (FieldName::TotalPopulation, population),
                (FieldName::Description, description),
                (FieldName::Image, image),
            ])?;
            let species_id = storage.create_species(UserId(owner), &fields).await?;
            println!("created species_id={}", species_id.0);
        }
        Command::List { owner } => {
            let species = match owner {
                Some(owner) => storage.list_species_for_owner(UserId(owner)).await?,
                None => storage.list_species().await?,
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&species)?);
            } else {
                for record in &species {
                    println!("{}", summary_line(record));
                }
            }
        }
        Command::Show { id } => {
            let species = storage.get_species(SpeciesId(id)).await?.ok_or_else(|| {
                ApiException::new(ErrorCode::NotFound, format!("no species with id {id}"))
            })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&species)?);
            } else {
                print_details(&species);
            }
        }
        Command::Delete { id, owner } => {
            SpeciesStore::delete(&storage, OwnerScope::new(SpeciesId(id), UserId(owner)))
                .await
                .with_context(|| format!("failed to delete species {id}"))?;
            println!("deleted species_id={id}");
        }
        Command::Seed { owner } => {
            for fields in sample_species() {
                let species_id = storage.create_species(UserId(owner), &fields).await?;
                println!(
                    "seeded species_id={} {}",
                    species_id.0, fields.scientific_name
                );
            }
        }
    }

    Ok(())
}

/// Runs raw CLI input through the same field table the GUI form uses.
fn validated_fields(inputs: &[(FieldName, Option<String>)]) -> Result<SpeciesFields> {
    let mut draft = FormDraft::blank();
    for (field, value) in inputs {
        if let Some(value) = value {
            let _ = draft.set(*field, value.as_str());
        }
    }
    Ok(draft.build()?)
}

fn summary_line(species: &Species) -> String {
    let common = species.common_name.as_deref().unwrap_or("-");
    format!(
        "{:>5}  owner={:<4} {:<9} {} ({common})",
        species.id, species.owner, species.kingdom, species.scientific_name
    )
}

fn print_details(species: &Species) {
    println!("id:               {}", species.id);
    println!("owner:            {}", species.owner);
    println!("scientific name:  {}", species.scientific_name);
    println!(
        "common name:      {}",
        species.common_name.as_deref().unwrap_or("")
    );
    println!("kingdom:          {}", species.kingdom);
    println!(
        "total population: {}",
        species
            .total_population
            .map(|count| count.to_string())
            .unwrap_or_else(|| "N/A".to_string())
    );
    println!(
        "description:      {}",
        species.description.as_deref().unwrap_or("")
    );
    println!("image:            {}", species.image.as_deref().unwrap_or(""));
    println!("created at:       {}", species.created_at.to_rfc3339());
}

fn sample_species() -> Vec<SpeciesFields> {
    use shared::domain::Kingdom;

    vec![
        SpeciesFields {
            scientific_name: "Panthera leo".to_string(),
            common_name: Some("Lion".to_string()),
            kingdom: Kingdom::Animalia,
            total_population: Some(23_000),
            description: Some(
                "Large social cat of African savannas, living in prides of related females."
                    .to_string(),
            ),
            image: None,
        },
        SpeciesFields {
            scientific_name: "Quercus robur".to_string(),
            common_name: Some("English oak".to_string()),
            kingdom: Kingdom::Plantae,
            total_population: None,
            description: Some("Long-lived deciduous tree native to most of Europe.".to_string()),
            image: None,
        },
        SpeciesFields {
            scientific_name: "Amanita muscaria".to_string(),
            common_name: Some("Fly agaric".to_string()),
            kingdom: Kingdom::Fungi,
            total_population: None,
            description: Some("Red-capped, white-spotted mushroom of birch and pine woods.".to_string()),
            image: None,
        },
        SpeciesFields {
            scientific_name: "Escherichia coli".to_string(),
            common_name: None,
            kingdom: Kingdom::Bacteria,
            total_population: None,
            description: None,
            image: None,
        },
    ]
}
