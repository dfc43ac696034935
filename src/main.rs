use anyhow::{anyhow, bail, Context, Result};
use hbnb_client::config::read_config;
use hbnb_client::gateway::{ApiClient, ApiError, SessionGuard};
use hbnb_client::models::{
    NewAmenity, NewPlace, NewReview, NewUser, Place, PropertyType, ReviewUpdate,
};
use hbnb_client::pipeline::{featured, Category, FilterCriteria, PlaceResults};
use hbnb_client::session::{FileSessionStore, Session, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "\
Usage: hbnb-client <command>

Commands:
  places [query] [--min-price N] [--max-price N] [--bedrooms N]
         [--type apartment|house|villa|cabin] [--amenity NAME]... [--page N]
  featured <new|top-rated|popular|unique>
  place <id>
  login <email> <password>
  logout
  whoami
  register <first-name> <last-name> <email> <password> [--bio TEXT]
  add-place <title> --price N --lat N --lon N [--description TEXT]
            [--bedrooms N] [--type KIND] [--amenity ID]...
  my-places
  amenity list
  amenity add <name> [description]
  review add <place-id> <rating> <text>
  review edit <review-id> [--rating N] [--text TEXT]
  review delete <review-id>";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = read_config()?;
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.session_path));
    let client = ApiClient::configure(&config.client, store.clone())?;
    let guard = SessionGuard::new(store.clone());

    info!("🏠 HBnB client → {}", client.base_url());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let outcome = match command.as_str() {
        "places" => list_places(&client, &guard, rest, config.page_size).await,
        "featured" => show_featured(&client, &guard, rest, config.featured_limit).await,
        "place" => show_place(&client, &guard, rest).await,
        "login" => login(&client, store.as_ref(), rest).await,
        "logout" => {
            store.clear()?;
            println!("Logged out");
            Ok(())
        }
        "whoami" => whoami(&client, &guard).await,
        "register" => register(&client, rest).await,
        "add-place" => add_place(&client, &guard, rest).await,
        "my-places" => my_places(&client, &guard).await,
        "amenity" => amenity(&client, &guard, rest).await,
        "review" => review(&client, &guard, rest).await,
        _ => {
            println!("{}", USAGE);
            bail!("unknown command '{}'", command)
        }
    };

    if let Err(err) = &outcome {
        if session_expired(command, err) {
            warn!("Your session has expired, run `hbnb-client login` again");
        }
    }
    outcome
}

/// A 401 means the stored token was rejected, except on login itself where
/// it means the credentials were wrong
fn session_expired(command: &str, err: &anyhow::Error) -> bool {
    command != "login"
        && err
            .downcast_ref::<ApiError>()
            .map(ApiError::is_unauthorized)
            .unwrap_or(false)
}

struct PlacesArgs {
    query: Option<String>,
    criteria: FilterCriteria,
    page: usize,
}

fn parse_places_args(args: &[String]) -> Result<PlacesArgs> {
    let mut parsed = PlacesArgs {
        query: None,
        criteria: FilterCriteria::default(),
        page: 1,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .with_context(|| format!("{} needs a value", arg))
        };
        match arg.as_str() {
            "--min-price" => parsed.criteria.min_price = Some(value()?.parse::<f64>().context("--min-price")?),
            "--max-price" => parsed.criteria.max_price = Some(value()?.parse::<f64>().context("--max-price")?),
            "--bedrooms" => parsed.criteria.min_bedrooms = Some(value()?.parse::<u32>().context("--bedrooms")?),
            "--type" => parsed.criteria.property_type = Some(PropertyType::from(value()?.as_str())),
            "--amenity" => parsed.criteria.require_amenity(&value()?),
            "--page" => parsed.page = value()?.parse::<usize>().context("--page")?,
            other if other.starts_with("--") => bail!("unknown option '{}'", other),
            other => parsed.query = Some(other.to_string()),
        }
    }

    Ok(parsed)
}

async fn list_places(client: &ApiClient, guard: &SessionGuard, args: &[String], page_size: usize) -> Result<()> {
    let args = parse_places_args(args)?;

    let mut results = PlaceResults::new(page_size);
    guard.check(results.refresh(client, args.query.as_deref()).await)?;
    results.set_criteria(args.criteria);
    results.go_to_page(args.page);

    match results.query() {
        Some(query) => println!("Places matching \"{}\"", query),
        None => println!("All available places"),
    }

    let displayed = results.displayed();
    if displayed.is_empty() {
        println!("No places match your filters.");
        return Ok(());
    }

    let first = (results.page() - 1) * results.page_size();
    for (i, place) in displayed.iter().enumerate() {
        print_place(first + i + 1, place);
    }
    println!(
        "Page {} of {} ({} places)",
        results.page(),
        results.total_pages(),
        results.filtered().len()
    );

    Ok(())
}

async fn show_featured(client: &ApiClient, guard: &SessionGuard, args: &[String], limit: usize) -> Result<()> {
    let category: Category = args
        .first()
        .map(String::as_str)
        .unwrap_or("new")
        .parse()?;

    let places = guard.check(client.list_places().await)?;
    let places = featured(&places, category, limit);

    println!("Featured: {}", category);
    if places.is_empty() {
        println!("No places found in this category.");
    }
    for (i, place) in places.iter().enumerate() {
        print_place(i + 1, place);
    }
    Ok(())
}

async fn show_place(client: &ApiClient, guard: &SessionGuard, args: &[String]) -> Result<()> {
    let id = args.first().context("place needs an id")?;

    let place = guard.check(client.get_place(id).await)?;
    let reviews = guard.check(client.list_reviews(id).await)?;

    print_place(1, &place);
    println!("   {}", place.description);
    if let (Some(lat), Some(lon)) = (place.latitude, place.longitude) {
        println!("   Location: {:.4}, {:.4}", lat, lon);
    }
    println!("   Reviews ({}):", reviews.len());
    for review in &reviews {
        println!("   {}★ {}", review.rating, review.text);
    }
    Ok(())
}

async fn login(client: &ApiClient, store: &dyn SessionStore, args: &[String]) -> Result<()> {
    let [email, password] = args else {
        bail!("usage: hbnb-client login <email> <password>");
    };

    let response = client.login(email, password).await.map_err(|e| {
        if e.is_unauthorized() {
            anyhow!("Invalid email or password")
        } else {
            anyhow::Error::new(e)
        }
    })?;
    store.set(Session::from(response))?;
    println!("Logged in as {}", email);
    Ok(())
}

async fn whoami(client: &ApiClient, guard: &SessionGuard) -> Result<()> {
    let user = guard.check(client.current_user().await)?;
    println!("{} <{}>{}", user.full_name(), user.email, if user.is_admin { " (admin)" } else { "" });
    if let Some(bio) = &user.bio {
        println!("{}", bio);
    }
    Ok(())
}

async fn register(client: &ApiClient, args: &[String]) -> Result<()> {
    let user = parse_register_args(args)?;
    let created = client.register(&user).await?;
    println!("Registered {} <{}>, you can now log in", created.full_name(), created.email);
    Ok(())
}

fn parse_register_args(args: &[String]) -> Result<NewUser> {
    let mut positional = Vec::new();
    let mut bio = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--bio" => bio = Some(iter.next().cloned().context("--bio needs a value")?),
            other if other.starts_with("--") => bail!("unknown option '{}'", other),
            other => positional.push(other.to_string()),
        }
    }

    let [first_name, last_name, email, password] = <[String; 4]>::try_from(positional)
        .map_err(|_| anyhow!("usage: hbnb-client register <first-name> <last-name> <email> <password>"))?;

    Ok(NewUser {
        first_name,
        last_name,
        email,
        password,
        bio,
    })
}

/// Id of the logged-in user, asking the backend if the session doesn't carry it
async fn current_user_id(client: &ApiClient, guard: &SessionGuard) -> Result<String> {
    let session = client
        .session()
        .get()
        .context("You need to log in first")?;
    if let Some(id) = session.user_id {
        return Ok(id);
    }
    let user = guard.check(client.current_user().await)?;
    Ok(user.id)
}

async fn add_place(client: &ApiClient, guard: &SessionGuard, args: &[String]) -> Result<()> {
    let owner_id = current_user_id(client, guard).await?;
    let place = parse_place_args(args, owner_id)?;

    let created = guard.check(client.create_place(&place).await)?;
    println!("Created place {}", created.id);
    print_place(1, &created);
    Ok(())
}

fn parse_place_args(args: &[String], owner_id: String) -> Result<NewPlace> {
    let mut title = None;
    let mut description = String::new();
    let mut price = None;
    let mut latitude = None;
    let mut longitude = None;
    let mut bedrooms = None;
    let mut property_type = None;
    let mut amenities = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .with_context(|| format!("{} needs a value", arg))
        };
        match arg.as_str() {
            "--description" => description = value()?,
            "--price" => price = Some(value()?.parse::<f64>().context("--price")?),
            "--lat" => latitude = Some(value()?.parse::<f64>().context("--lat")?),
            "--lon" => longitude = Some(value()?.parse::<f64>().context("--lon")?),
            "--bedrooms" => bedrooms = Some(value()?.parse::<u32>().context("--bedrooms")?),
            "--type" => property_type = Some(PropertyType::from(value()?.as_str())),
            "--amenity" => amenities.push(value()?),
            other if other.starts_with("--") => bail!("unknown option '{}'", other),
            other if title.is_none() => title = Some(other.to_string()),
            other => bail!("unexpected argument '{}'", other),
        }
    }

    let price = price.context("--price is required")?;
    if price < 0.0 {
        bail!("--price can't be negative");
    }
    let latitude = latitude.context("--lat is required")?;
    if !(-90.0..=90.0).contains(&latitude) {
        bail!("--lat must be between -90 and 90");
    }
    let longitude = longitude.context("--lon is required")?;
    if !(-180.0..=180.0).contains(&longitude) {
        bail!("--lon must be between -180 and 180");
    }

    Ok(NewPlace {
        title: title.context("add-place needs a title")?,
        description,
        price,
        latitude,
        longitude,
        bedrooms,
        property_type,
        owner_id,
        amenities,
    })
}

async fn my_places(client: &ApiClient, guard: &SessionGuard) -> Result<()> {
    let user_id = current_user_id(client, guard).await?;
    let places = guard.check(client.list_user_places(&user_id).await)?;

    if places.is_empty() {
        println!("You haven't listed any places yet.");
    }
    for (i, place) in places.iter().enumerate() {
        print_place(i + 1, place);
    }
    Ok(())
}

async fn amenity(client: &ApiClient, guard: &SessionGuard, args: &[String]) -> Result<()> {
    match args {
        [] => list_amenities(client, guard).await,
        [sub] if sub == "list" => list_amenities(client, guard).await,
        [sub, name, rest @ ..] if sub == "add" => {
            let amenity = NewAmenity {
                name: name.clone(),
                description: rest.join(" "),
            };
            let created = guard.check(client.create_amenity(&amenity).await)?;
            println!("Created amenity {} ({})", created.name, created.id);
            Ok(())
        }
        _ => bail!("usage: hbnb-client amenity list | amenity add <name> [description]"),
    }
}

async fn list_amenities(client: &ApiClient, guard: &SessionGuard) -> Result<()> {
    let amenities = guard.check(client.list_amenities().await)?;
    if amenities.is_empty() {
        println!("No amenities yet.");
    }
    for amenity in &amenities {
        if amenity.description.is_empty() {
            println!("{}  {}", amenity.id, amenity.name);
        } else {
            println!("{}  {}: {}", amenity.id, amenity.name, amenity.description);
        }
    }
    Ok(())
}

enum ReviewCommand {
    Add { place_id: String, rating: u8, text: String },
    Edit { id: String, update: ReviewUpdate },
    Delete { id: String },
}

fn parse_review_args(args: &[String]) -> Result<ReviewCommand> {
    match args {
        [sub, place_id, rating, text @ ..] if sub == "add" && !text.is_empty() => Ok(ReviewCommand::Add {
            place_id: place_id.clone(),
            rating: rating.parse::<u8>().context("rating")?,
            text: text.join(" "),
        }),
        [sub, id, rest @ ..] if sub == "edit" => {
            let mut update = ReviewUpdate::default();
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                let value = iter
                    .next()
                    .with_context(|| format!("{} needs a value", arg))?;
                match arg.as_str() {
                    "--rating" => update.rating = Some(value.parse::<u8>().context("--rating")?),
                    "--text" => update.text = Some(value.clone()),
                    other => bail!("unknown option '{}'", other),
                }
            }
            if update.rating.is_none() && update.text.is_none() {
                bail!("review edit needs --rating or --text");
            }
            Ok(ReviewCommand::Edit { id: id.clone(), update })
        }
        [sub, id] if sub == "delete" => Ok(ReviewCommand::Delete { id: id.clone() }),
        _ => bail!("usage: hbnb-client review add|edit|delete ..."),
    }
}

async fn review(client: &ApiClient, guard: &SessionGuard, args: &[String]) -> Result<()> {
    match parse_review_args(args)? {
        ReviewCommand::Add { place_id, rating, text } => {
            let user_id = current_user_id(client, guard).await?;
            let review = NewReview {
                text,
                rating,
                place_id,
                user_id,
            };
            let created = guard.check(client.create_review(&review).await)?;
            println!("Review {} posted ({}★)", created.id, created.rating);
        }
        ReviewCommand::Edit { id, update } => {
            let updated = guard.check(client.update_review(&id, &update).await)?;
            println!("Review {} updated ({}★)", updated.id, updated.rating);
        }
        ReviewCommand::Delete { id } => {
            guard.check(client.delete_review(&id).await)?;
            println!("Review {} deleted", id);
        }
    }
    Ok(())
}

fn print_place(n: usize, place: &Place) {
    let price = place
        .price
        .map(|p| format!("${:.2}/night", p))
        .unwrap_or_else(|| "price on request".to_string());
    println!("{}. {} ({})", n, place.title, price);

    let mut details = Vec::new();
    if let Some(bedrooms) = place.bedrooms {
        details.push(format!("{} bedrooms", bedrooms));
    }
    if let Some(kind) = &place.property_type {
        details.push(kind.to_string());
    }
    if let Some(avg) = place.average_rating() {
        details.push(format!("{:.1}★ from {} reviews", avg, place.reviews.len()));
    }
    if !details.is_empty() {
        println!("   {}", details.join(", "));
    }
    if !place.amenities.is_empty() {
        let names: Vec<&str> = place.amenities.iter().map(|a| a.name()).collect();
        println!("   Amenities: {}", names.join(", "));
    }
    println!("   ID: {}", place.id);
}
