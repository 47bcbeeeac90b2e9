//! Built-in seed catalog

use shop_agent_core::{Category, Product};

fn product(
    id: &str,
    name: &str,
    price: f64,
    image: &str,
    category: Category,
    description: &str,
) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category,
        price,
        image: image.to_string(),
    }
}

/// The default product set used when no catalog file is configured
pub fn products() -> Vec<Product> {
    use Category::*;

    vec![
        // Clothing
        product(
            "1",
            "Classic White T-Shirt",
            25.0,
            "/white-t-shirt.png",
            Clothing,
            "Premium cotton classic white t-shirt",
        ),
        product(
            "2",
            "Blue Denim Jeans",
            65.0,
            "/blue-denim-jeans.png",
            Clothing,
            "Comfortable slim-fit blue denim jeans",
        ),
        product(
            "3",
            "Running Shoes - Black",
            120.0,
            "/black-running-shoes.jpg",
            Clothing,
            "High-performance black running shoes",
        ),
        product(
            "4",
            "Winter Jacket - Navy",
            180.0,
            "/navy-winter-jacket.jpg",
            Clothing,
            "Warm and stylish navy winter jacket",
        ),
        product(
            "5",
            "Sports Hoodie",
            55.0,
            "/sports-hoodie.png",
            Clothing,
            "Comfortable sports hoodie for active wear",
        ),
        product(
            "6",
            "Leather Sneakers",
            95.0,
            "/leather-sneakers.png",
            Clothing,
            "Premium leather sneakers for casual wear",
        ),
        product(
            "7",
            "Yoga Pants",
            45.0,
            "/yoga-pants.jpg",
            Clothing,
            "Flexible and comfortable yoga pants",
        ),
        product(
            "8",
            "Baseball Cap",
            30.0,
            "/baseball-cap.png",
            Clothing,
            "Classic baseball cap with adjustable strap",
        ),
        // Electronics
        product(
            "9",
            "Wireless Headphones",
            150.0,
            "/wireless-headphones.png",
            Electronics,
            "Premium wireless headphones with noise cancellation",
        ),
        product(
            "10",
            "Smartphone - Latest Model",
            899.0,
            "/modern-smartphone.png",
            Electronics,
            "Latest flagship smartphone with advanced features",
        ),
        product(
            "11",
            "Laptop - 15\" Pro",
            1299.0,
            "/modern-laptop.png",
            Electronics,
            "High-performance 15-inch professional laptop",
        ),
        product(
            "12",
            "Bluetooth Speaker",
            79.0,
            "/bluetooth-speaker.jpg",
            Electronics,
            "Portable Bluetooth speaker with rich sound",
        ),
        product(
            "13",
            "Smartwatch",
            299.0,
            "/modern-smartwatch.png",
            Electronics,
            "Advanced smartwatch with health tracking",
        ),
        product(
            "14",
            "Tablet - 10\"",
            449.0,
            "/modern-tablet.png",
            Electronics,
            "10-inch tablet perfect for work and entertainment",
        ),
        product(
            "15",
            "Gaming Mouse",
            69.0,
            "/gaming-mouse.png",
            Electronics,
            "High-precision gaming mouse with RGB lighting",
        ),
        product(
            "16",
            "USB-C Hub",
            49.0,
            "/usb-hub.png",
            Electronics,
            "Multi-port USB-C hub for connectivity",
        ),
        // Home
        product(
            "17",
            "Coffee Maker",
            129.0,
            "/modern-coffee-maker.png",
            Home,
            "Programmable coffee maker with thermal carafe",
        ),
        product(
            "18",
            "Throw Pillow Set",
            45.0,
            "/decorative-throw-pillows.png",
            Home,
            "Set of decorative throw pillows for your sofa",
        ),
        product(
            "19",
            "Modern Table Lamp",
            75.0,
            "/modern-table-lamp.jpg",
            Home,
            "Sleek modern table lamp with LED bulb",
        ),
        product(
            "20",
            "Kitchen Knife Set",
            89.0,
            "/kitchen-knife-set.jpg",
            Home,
            "Professional kitchen knife set with wooden block",
        ),
        product(
            "21",
            "Plant Pot - Ceramic",
            35.0,
            "/ceramic-plant-pot.png",
            Home,
            "Beautiful ceramic plant pot for indoor plants",
        ),
        product(
            "22",
            "Cozy Blanket",
            55.0,
            "/cozy-blanket.png",
            Home,
            "Soft and cozy blanket for cold nights",
        ),
        product(
            "23",
            "Minimalist Clock",
            40.0,
            "/minimalist-wall-clock.png",
            Home,
            "Clean minimalist wall clock design",
        ),
        // Sports
        product(
            "24",
            "Yoga Mat - Premium",
            65.0,
            "/rolled-yoga-mat.png",
            Sports,
            "Premium non-slip yoga mat for all practices",
        ),
        product(
            "25",
            "Dumbbell Set",
            120.0,
            "/dumbbell-set.png",
            Sports,
            "Adjustable dumbbell set for home workouts",
        ),
        product(
            "26",
            "Water Bottle - Insulated",
            35.0,
            "/insulated-water-bottle.jpg",
            Sports,
            "Insulated water bottle keeps drinks cold for hours",
        ),
        product(
            "27",
            "Gym Bag",
            55.0,
            "/gym-bag.jpg",
            Sports,
            "Spacious gym bag with multiple compartments",
        ),
        product(
            "28",
            "Basketball",
            40.0,
            "/basketball-action.png",
            Sports,
            "Official size basketball for indoor and outdoor play",
        ),
    ]
}
